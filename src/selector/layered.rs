//! Login set partitioned into priority layers.
//!
//! A login lives in exactly one layer. Lower layers are preferred: random
//! pops draw from the lowest non-empty layer, and listing walks layers in
//! ascending order, preserving insertion order inside each layer.

use rand::Rng;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayeredSet {
    layers: BTreeMap<u32, Vec<String>>,
    index: HashMap<String, u32>,
}

impl LayeredSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set with every login on the same layer
    pub fn from_layer<I, S>(layer: u32, logins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for login in logins {
            set.insert(layer, login);
        }
        set
    }

    /// Insert a login at `layer`. No-op (returns false) if it is already
    /// present on any layer.
    pub fn insert(&mut self, layer: u32, login: impl Into<String>) -> bool {
        let login = login.into();
        if self.index.contains_key(&login) {
            return false;
        }
        self.index.insert(login.clone(), layer);
        self.layers.entry(layer).or_default().push(login);
        true
    }

    pub fn contains(&self, login: &str) -> bool {
        self.index.contains_key(login)
    }

    #[cfg(test)]
    pub fn layer_of(&self, login: &str) -> Option<u32> {
        self.index.get(login).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Members of `self`, then members of `other` not already present, each
    /// keeping its own layer.
    pub fn union(&self, other: &LayeredSet) -> LayeredSet {
        let mut out = self.clone();
        for (layer, login) in other.iter() {
            out.insert(layer, login);
        }
        out
    }

    /// Members of `self` for which `exclude` returns false.
    pub fn difference<F>(&self, exclude: F) -> LayeredSet
    where
        F: Fn(&str) -> bool,
    {
        let mut out = LayeredSet::new();
        for (layer, login) in self.iter() {
            if !exclude(login) {
                out.insert(layer, login);
            }
        }
        out
    }

    /// Remove and return a random member of the lowest non-empty layer.
    pub fn pop_random<R: Rng>(&mut self, rng: &mut R) -> Option<String> {
        let (&layer, members) = self.layers.iter_mut().next()?;
        let idx = rng.gen_range(0..members.len());
        let login = members.remove(idx);
        if members.is_empty() {
            self.layers.remove(&layer);
        }
        self.index.remove(&login);
        Some(login)
    }

    /// `(layer, login)` pairs, lowest layer first, insertion order within a layer
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.layers
            .iter()
            .flat_map(|(layer, members)| members.iter().map(move |m| (*layer, m.as_str())))
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(|(_, login)| login.to_string()).collect()
    }
}
