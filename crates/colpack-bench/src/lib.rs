//! Benchmark fixtures for the colpack packed-column container.
//!
//! Models a game-style entity update in three storage shapes:
//!
//! - [`EntityVec`]: array of structs, one [`Entity`] per element
//! - [`EntityColumns`]: one column per entity field, position and velocity
//!   aligned to 16 bytes
//! - [`TransformColumns`]: position and velocity packed into one
//!   [`Transform`] column
//!
//! All three are filled from the same seeded generator so runs compare the
//! same data.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::ops::{AddAssign, Mul};

use colpack_arrays::{Arrays, ArraysConfig};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Time step applied by every update.
pub const DT: f32 = 0.1;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl AddAssign for Vec4 {
    fn add_assign(&mut self, v: Vec4) {
        self.x += v.x;
        self.y += v.y;
        self.z += v.z;
        self.w += v.w;
    }
}

impl Mul<f32> for Vec4 {
    type Output = Vec4;

    fn mul(self, f: f32) -> Vec4 {
        Vec4 {
            x: self.x * f,
            y: self.y * f,
            z: self.z * f,
            w: self.w * f,
        }
    }
}

/// Fixed-size debug name, cold data the update loop never touches.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Name(pub [u8; 32]);

impl Name {
    pub fn new(text: &str) -> Self {
        let mut bytes = [0u8; 32];
        let len = text.len().min(bytes.len());
        bytes[..len].copy_from_slice(&text.as_bytes()[..len]);
        Name(bytes)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform {
    pub position: Vec4,
    pub velocity: Vec4,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entity {
    pub active: bool,
    pub id: u32,
    pub position: Vec4,
    pub velocity: Vec4,
    pub name: Name,
}

/// Array-of-structs storage.
pub type EntityVec = Vec<Entity>;

/// One column per entity field.
pub type EntityColumns = Arrays<(bool, u32, Vec4, Vec4, Name)>;

/// Hot fields grouped into a single transform column.
pub type TransformColumns = Arrays<(bool, u32, Transform, Name)>;

/// Uniform float in `[0, 1)` from the top 24 bits of a draw.
fn unit(rng: &mut ChaCha8Rng) -> f32 {
    (rng.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
}

fn random_vec4(rng: &mut ChaCha8Rng) -> Vec4 {
    Vec4 {
        x: unit(rng),
        y: unit(rng),
        z: unit(rng),
        w: unit(rng),
    }
}

/// Generate `n` entities, roughly `active_pct` percent of them active.
///
/// Deterministic for a given `seed`.
pub fn make_entities(n: usize, active_pct: u32, seed: u64) -> Vec<Entity> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let threshold = active_pct.min(100) as f32 / 100.0;
    (0..n)
        .map(|i| Entity {
            active: unit(&mut rng) < threshold,
            id: i as u32,
            position: random_vec4(&mut rng),
            velocity: random_vec4(&mut rng),
            name: Name::new(&format!("entity-{i}")),
        })
        .collect()
}

pub fn setup_vec(entities: &[Entity]) -> EntityVec {
    entities.to_vec()
}

/// Fill an [`EntityColumns`], aligning position and velocity to 16 bytes.
pub fn setup_columns(entities: &[Entity]) -> EntityColumns {
    let config = ArraysConfig::new().with_alignment(2, 16).with_alignment(3, 16);
    let mut columns = match EntityColumns::with_config(&config) {
        Ok(columns) => columns,
        Err(err) => panic!("entity column config rejected: {err}"),
    };
    columns.reserve(entities.len());
    for e in entities {
        columns.append((e.active, e.id, e.position, e.velocity, e.name));
    }
    columns
}

pub fn setup_transforms(entities: &[Entity]) -> TransformColumns {
    let mut columns = TransformColumns::with_capacity(entities.len());
    for e in entities {
        let transform = Transform {
            position: e.position,
            velocity: e.velocity,
        };
        columns.append((e.active, e.id, transform, e.name));
    }
    columns
}

pub fn update_vec(entities: &mut EntityVec) {
    for e in entities.iter_mut() {
        if e.active {
            e.position += e.velocity * DT;
        }
    }
}

pub fn update_columns(columns: &mut EntityColumns) {
    for (active, _, position, velocity, _) in columns.rows_mut() {
        if *active {
            *position += *velocity * DT;
        }
    }
}

pub fn update_transforms(columns: &mut TransformColumns) {
    for (active, _, transform, _) in columns.rows_mut() {
        if *active {
            transform.position += transform.velocity * DT;
        }
    }
}
