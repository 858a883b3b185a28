use crate::core::body::{Body, Tag};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Coefficients of restitution for body-body collisions: a global default, per-tag overrides
/// and per-tag-pair overrides.
#[derive(Debug, Clone)]
pub struct Elasticity {
    global: f64,
    single: HashMap<Tag, f64>,
    pair: HashMap<(Tag, Tag), f64>,
}

impl Default for Elasticity {
    fn default() -> Self {
        Self {
            global: 1.0,
            single: HashMap::new(),
            pair: HashMap::new(),
        }
    }
}

fn check(value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidParam(format!(
            "elasticity must be finite and > 0, got {value}"
        )))
    }
}

#[inline]
fn pair_key(a: Tag, b: Tag) -> (Tag, Tag) {
    (a.min(b), a.max(b))
}

impl Elasticity {
    #[inline]
    pub fn global(&self) -> f64 {
        self.global
    }

    pub fn set_global(&mut self, value: f64) -> Result<()> {
        self.global = check(value)?;
        Ok(())
    }

    pub fn set_tag(&mut self, tag: Tag, value: f64) -> Result<()> {
        self.single.insert(tag, check(value)?);
        Ok(())
    }

    /// Pair overrides are symmetric.
    pub fn set_pair(&mut self, a: Tag, b: Tag, value: f64) -> Result<()> {
        self.pair.insert(pair_key(a, b), check(value)?);
        Ok(())
    }

    /// Coefficient for a collision between `alpha` and `beta`.
    ///
    /// A pair value applies when both bodies carry exactly one tag each. Otherwise a tag value
    /// applies when exactly one side carries exactly one tag, whether the other side carries
    /// no tag or several. Otherwise, or when no entry is set, the global default applies.
    pub fn resolve(&self, alpha: &Body, beta: &Body) -> f64 {
        match (alpha.single_tag(), beta.single_tag()) {
            (Some(a), Some(b)) => self.pair.get(&pair_key(a, b)).copied(),
            (Some(t), None) | (None, Some(t)) => self.single.get(&t).copied(),
            (None, None) => None,
        }
        .unwrap_or(self.global)
    }
}
