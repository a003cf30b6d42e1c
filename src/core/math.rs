//! Collection aliases shared across the crate: ordered, deterministic-
//! iteration collections everywhere a result's iteration order is
//! user-visible (state ids in error messages, traced subset contents).

use std::collections::{BTreeMap, BTreeSet};

pub type OrderedSet<T> = BTreeSet<T>;
pub type Map<K, V> = BTreeMap<K, V>;
