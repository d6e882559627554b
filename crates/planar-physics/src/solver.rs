//! Fixed-tick physics step
//!
//! One call to [`PhysicsStep::update`] runs the whole pipeline over the bodies
//! of a [`BodyRegistry`]:
//!
//! 1. gather (transform, body, collider) entries
//! 2. integrate velocities and positions
//! 3. broadphase candidate pairs
//! 4. narrow phase contacts, sorted by [`PairKey`]
//! 5. sequential impulse velocity solve with friction
//! 6. positional correction
//! 7. sleep bookkeeping
//!
//! The step works on gathered copies and writes positions and bodies back only
//! when every stage succeeds.

use std::fmt;

use ahash::AHashSet;
use planar_core::math::DVec2;
use planar_core::{Entity, Transform2D};

use crate::body::{BodyType, RigidBody};
use crate::broadphase::{Proxy, SpatialHash};
use crate::collider::Collider;
use crate::config::{PhysicsConfig, StepStats};
use crate::error::{PhysicsResult, ShapeResultExt};
use crate::registry::BodyRegistry;

const EPSILON: f64 = 1e-8;

/// Share of the remaining penetration removed per position iteration
const CORRECTION_PERCENT: f64 = 0.8;

/// Canonical identity of an unordered pair of entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(pub u64, pub u64);

impl PairKey {
    pub fn new(a: Entity, b: Entity) -> Self {
        let (a, b) = (a.to_bits(), b.to_bits());
        if a <= b { Self(a, b) } else { Self(b, a) }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

/// A resolved overlap from the last step
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub key: PairKey,
    pub a: Entity,
    pub b: Entity,
    /// Unit vector from `a` toward `b`
    pub normal: DVec2,
    pub penetration: f64,
    index_a: usize,
    index_b: usize,
}

#[derive(Debug)]
struct BodyEntry {
    entity: Entity,
    transform: Transform2D,
    body: RigidBody,
    collider: Collider,
    /// Curve colliders never move
    forced_static: bool,
    touched: bool,
}

impl BodyEntry {
    fn effective_inv_mass(&self) -> f64 {
        if self.forced_static || self.body.is_sleeping() {
            0.0
        } else {
            self.body.inv_mass()
        }
    }

    fn is_movable(&self) -> bool {
        !self.forced_static
            && !self.body.is_sleeping()
            && matches!(self.body.body_type(), BodyType::Dynamic | BodyType::Kinematic)
    }
}

/// Physics step state
pub struct PhysicsStep {
    config: PhysicsConfig,
    broadphase: SpatialHash,
    excluded: AHashSet<Entity>,
    warned_curves: AHashSet<Entity>,
    stats: StepStats,
    contacts: Vec<Contact>,
}

impl PhysicsStep {
    pub fn new(config: PhysicsConfig) -> PhysicsResult<Self> {
        let config = config.validated()?;
        let broadphase = SpatialHash::new(config.broadphase_cell_size)?;
        Ok(Self {
            config,
            broadphase,
            excluded: AHashSet::new(),
            warned_curves: AHashSet::new(),
            stats: StepStats::default(),
            contacts: Vec::new(),
        })
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn last_step_stats(&self) -> StepStats {
        self.stats
    }

    /// Contacts of the last step in resolution order
    pub fn last_contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Entities dropped from simulation for missing a transform or collider
    pub fn is_excluded(&self, entity: Entity) -> bool {
        self.excluded.contains(&entity)
    }

    /// Advance every registered body by `dt` seconds
    pub fn update<R: BodyRegistry + ?Sized>(&mut self, dt: f64, registry: &mut R) -> PhysicsResult<()> {
        let mut entries = self.collect(registry);

        self.integrate(dt, &mut entries);

        let proxies = entries
            .iter()
            .map(|entry| {
                Ok(Proxy {
                    key: entry.entity.to_bits(),
                    aabb: entry.collider.bbox(&entry.transform).for_entity(entry.entity)?,
                    layer: entry.collider.layer(),
                    mask: entry.collider.collision_mask(),
                })
            })
            .collect::<PhysicsResult<Vec<_>>>()?;
        let pairs = self.broadphase.query_pairs(&proxies);

        let mut contacts = Self::find_contacts(&mut entries, &pairs)?;
        contacts.sort_by_key(|contact| contact.key);

        for _ in 0..self.config.velocity_iterations {
            for contact in &contacts {
                Self::solve_velocity(contact, &mut entries);
            }
        }

        for _ in 0..self.config.position_iterations {
            for contact in &contacts {
                self.solve_position(contact, &mut entries);
            }
        }

        self.update_sleeping(dt, &mut entries);

        self.stats = StepStats {
            colliders: entries.len(),
            broadphase_pairs: pairs.len(),
            contacts: contacts.len(),
            sleeping_bodies: entries.iter().filter(|e| e.body.is_sleeping()).count(),
        };
        log::trace!("physics step: {:?}", self.stats);

        for entry in entries {
            if let Some(transform) = registry.transform_mut(entry.entity) {
                transform.position = entry.transform.position;
            }
            if let Some(body) = registry.body_mut(entry.entity) {
                *body = entry.body;
            }
        }
        self.contacts = contacts;

        Ok(())
    }

    fn collect<R: BodyRegistry + ?Sized>(&mut self, registry: &mut R) -> Vec<BodyEntry> {
        let bodies = registry.bodies();
        self.prune_departed(&bodies);
        let mut entries = Vec::with_capacity(bodies.len());

        for entity in bodies {
            if self.excluded.contains(&entity) {
                continue;
            }

            let Some(transform) = registry.transform_mut(entity).copied() else {
                log::warn!("entity {entity} has a rigid body but no transform; excluding it from physics");
                self.excluded.insert(entity);
                continue;
            };
            let Some(collider) = registry.collider(entity).cloned() else {
                log::warn!("entity {entity} has a rigid body but no collider; excluding it from physics");
                self.excluded.insert(entity);
                continue;
            };
            let Some(body) = registry.body_mut(entity).cloned() else {
                continue;
            };

            let forced_static = collider.shape().is_curve();
            if forced_static
                && body.body_type() != BodyType::Static
                && self.warned_curves.insert(entity)
            {
                log::warn!("entity {entity} has a curve collider on a non-static body; treating it as static");
            }

            entries.push(BodyEntry {
                entity,
                transform,
                body,
                collider,
                forced_static,
                touched: false,
            });
        }

        entries
    }

    /// Forget warn-once entries for entities the registry no longer lists
    fn prune_departed(&mut self, bodies: &[Entity]) {
        if self.excluded.is_empty() && self.warned_curves.is_empty() {
            return;
        }
        let live: AHashSet<Entity> = bodies.iter().copied().collect();
        self.excluded.retain(|entity| live.contains(entity));
        self.warned_curves.retain(|entity| live.contains(entity));
    }

    fn integrate(&self, dt: f64, entries: &mut [BodyEntry]) {
        for entry in entries.iter_mut().filter(|e| !e.forced_static) {
            let body = &mut entry.body;
            match body.body_type() {
                BodyType::Static => {}
                BodyType::Kinematic => {
                    entry.transform.position += body.velocity() * dt;
                }
                BodyType::Dynamic => {
                    if body.is_sleeping() {
                        continue;
                    }
                    let accel = self.config.gravity * body.gravity_scale()
                        + body.consume_forces() * body.inv_mass();
                    let damping = (1.0 - body.linear_damping() * dt).max(0.0);
                    let velocity = (body.velocity() + accel * dt) * damping;
                    body.set_integrated_velocity(velocity);
                    entry.transform.position += velocity * dt;
                }
            }
        }
    }

    fn find_contacts(entries: &mut [BodyEntry], pairs: &[(usize, usize)]) -> PhysicsResult<Vec<Contact>> {
        let mut contacts = Vec::with_capacity(pairs.len());

        for &(i, j) in pairs {
            let (a, b) = (&entries[i], &entries[j]);
            let colliding = a
                .collider
                .is_colliding(&a.transform, &b.collider, &b.transform)
                .for_entity(a.entity)?;
            if !colliding {
                continue;
            }
            let Some(mtv) = a
                .collider
                .collision_normal(&a.transform, &b.collider, &b.transform)
                .for_entity(a.entity)?
            else {
                continue;
            };

            let penetration = mtv.length();
            if penetration <= EPSILON {
                continue;
            }

            contacts.push(Contact {
                key: PairKey::new(a.entity, b.entity),
                a: a.entity,
                b: b.entity,
                // mtv separates a from b, so the normal toward b is its reverse
                normal: -mtv / penetration,
                penetration,
                index_a: i,
                index_b: j,
            });

            let (wake_b, wake_a) = (a.is_movable(), b.is_movable());
            for (index, wake) in [(i, wake_a), (j, wake_b)] {
                let entry = &mut entries[index];
                if entry.body.is_dynamic() {
                    entry.touched = true;
                }
                if wake {
                    entry.body.wake();
                }
            }
        }

        Ok(contacts)
    }

    fn solve_velocity(contact: &Contact, entries: &mut [BodyEntry]) {
        let inv_a = entries[contact.index_a].effective_inv_mass();
        let inv_b = entries[contact.index_b].effective_inv_mass();
        if inv_a == 0.0 && inv_b == 0.0 {
            return;
        }
        let inv_sum = inv_a + inv_b;

        let (a, b) = pair_mut(entries, contact.index_a, contact.index_b);
        let normal = contact.normal;

        let relative = b.body.velocity() - a.body.velocity();
        let along_normal = relative.dot(normal);
        if along_normal > 0.0 {
            return;
        }

        let restitution = a.body.restitution().max(b.body.restitution());
        let impulse_scalar = -(1.0 + restitution) * along_normal / inv_sum;
        apply_pair_impulse(a, b, inv_a, inv_b, normal * impulse_scalar);

        let relative = b.body.velocity() - a.body.velocity();
        let tangent = relative - normal * relative.dot(normal);
        if tangent.length() <= EPSILON {
            return;
        }
        let tangent = tangent.normalize();

        let max_friction = impulse_scalar * (a.body.friction() * b.body.friction()).sqrt();
        let jt = (-relative.dot(tangent) / inv_sum).max(-max_friction).min(max_friction);
        apply_pair_impulse(a, b, inv_a, inv_b, tangent * jt);
    }

    fn solve_position(&self, contact: &Contact, entries: &mut [BodyEntry]) {
        let inv_a = entries[contact.index_a].effective_inv_mass();
        let inv_b = entries[contact.index_b].effective_inv_mass();
        if inv_a == 0.0 && inv_b == 0.0 {
            return;
        }
        let inv_sum = inv_a + inv_b;

        let corrected = (contact.penetration - self.config.penetration_slop).max(0.0);
        if corrected <= EPSILON {
            return;
        }

        // Total separation is independent of mass; each side takes its
        // inverse-mass share of it.
        let magnitude = (corrected * CORRECTION_PERCENT).min(self.config.max_penetration_correction);
        let correction = contact.normal * (magnitude / inv_sum);

        let (a, b) = pair_mut(entries, contact.index_a, contact.index_b);
        if inv_a > 0.0 {
            a.transform.position -= correction * inv_a;
        }
        if inv_b > 0.0 {
            b.transform.position += correction * inv_b;
        }
    }

    fn update_sleeping(&self, dt: f64, entries: &mut [BodyEntry]) {
        for entry in entries.iter_mut() {
            let body = &mut entry.body;
            if !body.can_sleep() || !body.is_dynamic() || body.is_sleeping() {
                continue;
            }

            if !entry.touched && body.velocity().length() <= self.config.sleep_linear_threshold {
                body.accumulate_sleep_time(dt);
                if body.sleep_time() >= self.config.sleep_time_threshold {
                    body.sleep();
                    log::debug!("entity {} fell asleep", entry.entity);
                }
            } else {
                body.reset_sleep_time();
            }
        }
    }
}

fn pair_mut(entries: &mut [BodyEntry], i: usize, j: usize) -> (&mut BodyEntry, &mut BodyEntry) {
    debug_assert!(i < j);
    let (head, tail) = entries.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// `impulse` pushes `b` along it and `a` against it
fn apply_pair_impulse(a: &mut BodyEntry, b: &mut BodyEntry, inv_a: f64, inv_b: f64, impulse: DVec2) {
    if inv_a > 0.0 {
        a.body.apply_impulse(-impulse);
    }
    if inv_b > 0.0 {
        b.body.apply_impulse(impulse);
    }
}
