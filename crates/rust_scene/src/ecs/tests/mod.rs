//! Integration tests exercising the whole hierarchy and visibility pipeline

mod hierarchy_integration;
