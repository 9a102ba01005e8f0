//! Scene visibility demo
//!
//! Builds a randomized fleet of ships with escorts, flies a camera past it
//! and logs what the visibility pipeline keeps each frame. An optional
//! `.toml` or `.ron` scene config path can be passed as the first argument.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_scene::prelude::*;

const FLEET_SIZE: usize = 40;
const FRAMES: usize = 30;

struct FleetDemo {
    scene: SceneManager,
    camera: Camera,
    sun: Entity,
    ships: Vec<Entity>,
    rng: StdRng,
}

impl FleetDemo {
    fn new(config: SceneConfig) -> Result<Self, ConfigError> {
        let mut scene = SceneManager::with_config(config)?;
        let mut rng = StdRng::seed_from_u64(0x5eed);

        let world = scene.world_mut();
        let sun = world.create_entity();
        world.add_component(
            sun,
            DirectionalLightComponent::new(Vec3::new(-0.4, -1.0, -0.2)).with_color(Vec3::new(1.0, 0.95, 0.8), 1.2),
        );

        let mut ships = Vec::with_capacity(FLEET_SIZE);
        for _ in 0..FLEET_SIZE {
            let position = Vec3::new(
                rng.gen_range(-150.0..150.0),
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-300.0..0.0),
            );
            let heading = Quat::from_axis_angle(&Vec3::y_axis(), rng.gen_range(0.0..std::f32::consts::TAU));
            let ship = spawn_drawable(
                world,
                TransformComponent::from_position(position)
                    .with_orientation(heading)
                    .with_keep_children_alive(rng.gen_bool(0.5)),
                rng.gen_range(2.0..6.0),
                RenderableComponent::Model(0),
            );

            for _ in 0..rng.gen_range(0..4) {
                let offset = Vec3::new(rng.gen_range(-12.0..12.0), rng.gen_range(-3.0..3.0), rng.gen_range(-12.0..12.0));
                let escort = spawn_drawable(
                    world,
                    TransformComponent::from_position(offset).with_uniform_scale(0.5),
                    1.5,
                    RenderableComponent::Primitive(PrimitiveShape::Sphere),
                );
                if let Err(error) = world.add_child(ship, escort) {
                    log::warn!("Could not attach escort: {}", error);
                }
            }
            ships.push(ship);
        }
        log::info!("Spawned {} ships, {} entities total", ships.len(), world.entity_count());

        let camera = Camera::perspective(Vec3::new(0.0, 10.0, 40.0), 90.0, Viewport::new(1920.0, 1080.0), 0.5, 250.0)
            .looking_at(Vec3::new(0.0, 0.0, -100.0), Vec3::y());

        Ok(Self { scene, camera, sun, ships, rng })
    }

    fn run(&mut self) {
        for frame in 0..FRAMES {
            self.step_gameplay(frame);

            let visibility = self.scene.update_frame(&self.camera, Some(self.sun));
            let stats = self.scene.stats();
            log::info!(
                "Frame {:2}: {:3} entities, {:3} visible, casters {:?}, destroyed {}, {} us",
                stats.frame_index,
                stats.entity_count,
                visibility.renderables.len(),
                stats.shadow_caster_counts,
                stats.destroyed_count,
                stats.total_frame_time_us()
            );
        }

        let bounds = self.scene.shadow_map().view_far_bounds();
        log::info!("Final cascade far bounds: {:?}", bounds);
    }

    /// Advance the camera and occasionally destroy a ship
    fn step_gameplay(&mut self, frame: usize) {
        let position = self.camera.position + Vec3::new(0.0, 0.0, -8.0);
        self.camera.position = position;

        if frame % 5 == 4 && !self.ships.is_empty() {
            let index = self.rng.gen_range(0..self.ships.len());
            let ship = self.ships.swap_remove(index);
            if let Some(transform) = self.scene.world_mut().get_component_mut::<TransformComponent>(ship) {
                log::debug!("Destroying ship {} (keep escorts: {})", ship.id(), transform.keep_children_alive);
                transform.mark_for_delete();
            }
        }
    }
}

fn spawn_drawable(world: &mut World, transform: TransformComponent, radius: f32, renderable: RenderableComponent) -> Entity {
    let entity = world.spawn_spatial(transform, VolumeComponent::from_radius(radius));
    world.add_component(entity, MaterialComponent::visible());
    world.add_component(entity, renderable);
    entity
}

fn load_config() -> Result<SceneConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading scene config from {}", path);
            SceneConfig::load_from_file(&path)
        }
        None => Ok(SceneConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    rust_scene::foundation::logging::init_with_default("info");

    log::info!("Starting scene visibility demo");
    let config = load_config()?;
    let mut demo = FleetDemo::new(config)?;
    demo.run();
    log::info!("Demo finished");
    Ok(())
}
