//! Scenario files and built-in demos

use std::f64::consts::TAU;

use anyhow::{ensure, Context, Result};
use clap::ValueEnum;
use planar_core::{DVec2, Entity, Transform2D, World};
use planar_physics::{
    Anchor, BodyType, Collider, Curve, LayerMask, PhysicsConfig, RigidBody, RigidBodyDesc, Shape,
};
use serde::{Deserialize, Serialize};

/// A physics configuration plus the bodies to simulate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub config: PhysicsConfig,
    pub bodies: Vec<BodySpec>,
}

/// One simulated entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodySpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub transform: Transform2D,
    #[serde(default)]
    pub body: RigidBodyDesc,
    pub shape: ShapeDesc,
    #[serde(default)]
    pub anchor: Anchor,
    #[serde(default = "default_layer")]
    pub layer: LayerMask,
    #[serde(default = "default_mask")]
    pub mask: LayerMask,
    #[serde(default)]
    pub velocity: DVec2,
}

fn default_layer() -> LayerMask {
    1
}

fn default_mask() -> LayerMask {
    LayerMask::MAX
}

/// Collider geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeDesc {
    Rectangle { width: f64, height: f64 },
    Circle { radius: f64 },
    Curve {
        profile: TerrainProfile,
        #[serde(default)]
        width: Option<f64>,
    },
}

/// Height function of a curve, in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TerrainProfile {
    Flat { y: f64 },
    Sine { base: f64, amplitude: f64, wavelength: f64 },
}

impl TerrainProfile {
    pub fn height_fn(self) -> Result<impl Fn(f64) -> f64 + Send + Sync + 'static> {
        if let TerrainProfile::Sine { wavelength, .. } = self {
            ensure!(
                wavelength.is_finite() && wavelength > 0.0,
                "terrain wavelength must be finite and > 0 (got {wavelength})"
            );
        }
        Ok(move |x: f64| match self {
            TerrainProfile::Flat { y } => y,
            TerrainProfile::Sine {
                base,
                amplitude,
                wavelength,
            } => base + amplitude * (TAU * x / wavelength).sin(),
        })
    }
}

impl ShapeDesc {
    pub fn build(&self) -> Result<Shape> {
        let shape = match *self {
            ShapeDesc::Rectangle { width, height } => Shape::rectangle(width, height)?,
            ShapeDesc::Circle { radius } => Shape::circle(radius)?,
            ShapeDesc::Curve { profile, width } => {
                let height_fn = profile.height_fn()?;
                match width {
                    Some(width) => Shape::Curve(Curve::with_width(height_fn, width)?),
                    None => Shape::curve(height_fn),
                }
            }
        };
        Ok(shape)
    }
}

impl BodySpec {
    pub fn new(position: DVec2, shape: ShapeDesc) -> Self {
        Self {
            name: None,
            transform: Transform2D::from_position(position),
            body: RigidBodyDesc::default(),
            shape,
            anchor: Anchor::Center,
            layer: default_layer(),
            mask: default_mask(),
            velocity: DVec2::ZERO,
        }
    }

    fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    fn body_type(mut self, body_type: BodyType) -> Self {
        self.body.body_type = body_type;
        self
    }

    fn friction(mut self, friction: f64) -> Self {
        self.body.friction = friction;
        self
    }

    fn restitution(mut self, restitution: f64) -> Self {
        self.body.restitution = restitution;
        self
    }

    fn velocity(mut self, velocity: DVec2) -> Self {
        self.velocity = velocity;
        self
    }
}

/// A spawned scenario
pub struct Spawned {
    pub world: World,
    /// Display name and entity, in scenario order
    pub bodies: Vec<(String, Entity)>,
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid scenario JSON")
    }

    pub fn spawn(&self) -> Result<Spawned> {
        let mut world = World::new();
        let mut bodies = Vec::with_capacity(self.bodies.len());

        for (index, spec) in self.bodies.iter().enumerate() {
            let name = spec.name.clone().unwrap_or_else(|| format!("body-{index}"));
            let shape = spec
                .shape
                .build()
                .with_context(|| format!("invalid shape for {name}"))?;

            let mut body = RigidBody::from_desc(&spec.body);
            body.set_velocity(spec.velocity);

            let entity = world.spawn();
            world.add_component(entity, spec.transform);
            world.add_component(entity, body);
            world.add_component(
                entity,
                Collider::new(shape)
                    .with_anchor(spec.anchor)
                    .with_layer(spec.layer)
                    .with_mask(spec.mask),
            );
            bodies.push((name, entity));
        }

        Ok(Spawned { world, bodies })
    }
}

/// Built-in scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    /// A box dropped onto a floor
    Drop,
    /// A box sliding to rest on a high-friction floor
    Slide,
    /// A column of boxes settling on a floor
    Stack,
    /// Balls rolling over sine terrain
    Terrain,
}

fn floor(y: f64) -> BodySpec {
    BodySpec::new(
        DVec2::new(0.0, y),
        ShapeDesc::Rectangle {
            width: 800.0,
            height: 40.0,
        },
    )
    .named("floor")
    .body_type(BodyType::Static)
    .friction(1.0)
}

fn crate_box(name: &str, x: f64, y: f64) -> BodySpec {
    BodySpec::new(
        DVec2::new(x, y),
        ShapeDesc::Rectangle {
            width: 20.0,
            height: 20.0,
        },
    )
    .named(name)
}

impl Demo {
    pub fn scenario(self) -> Scenario {
        let bodies = match self {
            Demo::Drop => vec![
                floor(300.0),
                crate_box("box", 0.0, 0.0).restitution(0.3),
            ],
            Demo::Slide => vec![
                floor(300.0),
                crate_box("slider", -200.0, 270.0)
                    .friction(1.0)
                    .velocity(DVec2::new(300.0, 0.0)),
            ],
            Demo::Stack => {
                let mut bodies = vec![floor(300.0)];
                for level in 0..5 {
                    let name = format!("box-{level}");
                    bodies.push(crate_box(&name, 0.0, 269.0 - level as f64 * 21.0).friction(0.6));
                }
                bodies
            }
            Demo::Terrain => {
                let terrain = BodySpec::new(
                    DVec2::new(-1000.0, 200.0),
                    ShapeDesc::Curve {
                        profile: TerrainProfile::Sine {
                            base: 200.0,
                            amplitude: 30.0,
                            wavelength: 400.0,
                        },
                        width: Some(2000.0),
                    },
                )
                .named("terrain")
                .body_type(BodyType::Static);
                let mut bodies = vec![terrain];
                for i in 0..4 {
                    bodies.push(
                        BodySpec::new(
                            DVec2::new(-150.0 + i as f64 * 100.0, 0.0),
                            ShapeDesc::Circle { radius: 12.0 },
                        )
                        .named(&format!("ball-{i}"))
                        .velocity(DVec2::new(40.0, 0.0)),
                    );
                }
                bodies
            }
        };

        Scenario {
            config: PhysicsConfig::default(),
            bodies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_json(
            r#"{
                "config": { "gravity": [0.0, 500.0] },
                "bodies": [
                    {
                        "name": "ground",
                        "transform": { "position": [0.0, 100.0] },
                        "body": { "body_type": "static" },
                        "shape": { "type": "rectangle", "width": 200.0, "height": 20.0 }
                    },
                    {
                        "shape": { "type": "circle", "radius": 5.0 },
                        "anchor": "top-left",
                        "layer": 2,
                        "velocity": [10.0, 0.0]
                    },
                    {
                        "body": { "body_type": "static" },
                        "shape": {
                            "type": "curve",
                            "profile": { "kind": "sine", "base": 50.0, "amplitude": 5.0, "wavelength": 100.0 }
                        }
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(scenario.config.gravity, DVec2::new(0.0, 500.0));
        assert_eq!(scenario.config.velocity_iterations, 4);
        assert_eq!(scenario.bodies.len(), 3);
        assert_eq!(scenario.bodies[0].transform.scale, 1.0);
        assert_eq!(scenario.bodies[1].anchor, Anchor::TopLeft);
        assert_eq!(scenario.bodies[1].mask, LayerMask::MAX);

        let spawned = scenario.spawn().unwrap();
        assert_eq!(spawned.bodies[0].0, "ground");
        assert_eq!(spawned.bodies[1].0, "body-1");
        let ball = spawned.bodies[1].1;
        let body = spawned.world.get_component::<RigidBody>(ball).unwrap();
        assert_eq!(body.velocity(), DVec2::new(10.0, 0.0));
        let collider = spawned.world.get_component::<Collider>(ball).unwrap();
        assert_eq!(collider.layer(), 2);
    }

    #[test]
    fn test_invalid_shapes_rejected() {
        let bad = ShapeDesc::Circle { radius: -1.0 };
        assert!(bad.build().is_err());
        let bad = ShapeDesc::Curve {
            profile: TerrainProfile::Sine {
                base: 0.0,
                amplitude: 1.0,
                wavelength: 0.0,
            },
            width: None,
        };
        assert!(bad.build().is_err());
        assert!(Scenario::from_json(r#"{"bodies": [{"shape": {"type": "hexagon"}}]}"#).is_err());
    }

    #[test]
    fn test_terrain_profiles() {
        let flat = TerrainProfile::Flat { y: 12.0 }.height_fn().unwrap();
        assert_eq!(flat(-300.0), 12.0);
        let sine = TerrainProfile::Sine {
            base: 10.0,
            amplitude: 2.0,
            wavelength: 8.0,
        }
        .height_fn()
        .unwrap();
        assert!((sine(2.0) - 12.0).abs() < 1e-12);
        assert!((sine(6.0) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_demos_spawn() {
        for demo in [Demo::Drop, Demo::Slide, Demo::Stack, Demo::Terrain] {
            let spawned = demo.scenario().spawn().unwrap();
            assert!(spawned.bodies.len() >= 2);
        }
    }
}
