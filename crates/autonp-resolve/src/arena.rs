//! Identity arena shared by compound and target resolution.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::hash::Hash;

use tracing::debug;

/// One identity under construction.
#[derive(Debug)]
pub(crate) struct Identity<K> {
    /// Lexicographically smallest rendering of `keys`, or `name:<key>`.
    pub primary_key: String,
    /// Key the identity was created under; unique across the arena.
    founding_key: String,
    pub keys: BTreeSet<K>,
    /// Indices of the records resolved here, ascending.
    pub members: Vec<usize>,
    /// Primary keys of identities folded into this one.
    pub absorbed: Vec<String>,
    /// Established by display name rather than a structural key.
    pub by_name: bool,
    parent: Option<usize>,
}

impl<K: Display> Identity<K> {
    fn refresh_primary_key(&mut self) {
        if let Some(smallest) = self.keys.iter().map(|k| k.to_string()).min() {
            self.primary_key = smallest;
        }
    }
}

/// Arena of identities keyed by structural key or normalized name.
///
/// Structural and name identities live in separate indexes and never merge
/// with each other.
#[derive(Debug)]
pub(crate) struct IdentityArena<K> {
    identities: Vec<Identity<K>>,
    key_index: HashMap<K, usize>,
    name_index: HashMap<String, usize>,
}

impl<K: Clone + Ord + Hash + Display> IdentityArena<K> {
    pub fn new() -> Self {
        Self {
            identities: Vec::new(),
            key_index: HashMap::new(),
            name_index: HashMap::new(),
        }
    }

    fn create(&mut self, primary_key: String, by_name: bool) -> usize {
        self.identities.push(Identity {
            founding_key: primary_key.clone(),
            primary_key,
            keys: BTreeSet::new(),
            members: Vec::new(),
            absorbed: Vec::new(),
            by_name,
            parent: None,
        });
        self.identities.len() - 1
    }

    /// Resolve a record to an identity, creating one if needed.
    ///
    /// Structural keys win; the name key is used only when `keys` is empty.
    /// A record whose keys are already owned by different identities is
    /// attached to the first one found; `reconcile` folds the rest later.
    pub fn resolve(&mut self, keys: &[K], name_key: Option<&str>, member: usize) -> Option<usize> {
        let id = if let Some(first) = keys.first() {
            let hit = keys
                .iter()
                .find_map(|k| self.key_index.get(k).copied())
                .map(|id| self.find(id));
            let id = match hit {
                Some(id) => id,
                None => self.create(first.to_string(), false),
            };
            for key in keys {
                self.identities[id].keys.insert(key.clone());
                self.key_index.entry(key.clone()).or_insert(id);
            }
            self.identities[id].refresh_primary_key();
            id
        } else {
            let name = name_key.filter(|n| !n.is_empty())?;
            match self.name_index.get(name) {
                Some(&id) => id,
                None => {
                    let id = self.create(format!("name:{}", name), true);
                    self.name_index.insert(name.to_string(), id);
                    id
                }
            }
        };
        self.attach(id, member);
        Some(id)
    }

    /// Identity currently owning a structural key, if any.
    pub fn lookup(&self, key: &K) -> Option<usize> {
        self.key_index.get(key).map(|&id| self.find(id))
    }

    pub fn attach(&mut self, id: usize, member: usize) {
        let members = &mut self.identities[id].members;
        if let Err(pos) = members.binary_search(&member) {
            members.insert(pos, member);
        }
    }

    /// Root identity after folding.
    pub fn find(&self, mut id: usize) -> usize {
        while let Some(parent) = self.identities[id].parent {
            id = parent;
        }
        id
    }

    pub fn get(&self, id: usize) -> &Identity<K> {
        &self.identities[self.find(id)]
    }

    /// Fold identities whose structural key sets overlap. The identity with
    /// the lexicographically smallest primary key survives (ties go to the
    /// smaller founding key). Returns the number of folds.
    pub fn reconcile(&mut self) -> usize {
        let mut owner: HashMap<K, usize> = HashMap::new();
        let mut folds = 0;

        for id in 0..self.identities.len() {
            if self.identities[id].parent.is_some() {
                continue;
            }
            let keys: Vec<K> = self.identities[id].keys.iter().cloned().collect();
            for key in keys {
                let current = self.find(id);
                match owner.get(&key).map(|&o| self.find(o)) {
                    Some(other) if other != current => {
                        self.fold(other, current);
                        folds += 1;
                    }
                    Some(_) => {}
                    None => {
                        owner.insert(key, current);
                    }
                }
            }
        }

        if folds > 0 {
            let repointed: Vec<(K, usize)> = self
                .key_index
                .iter()
                .map(|(k, &id)| (k.clone(), self.find(id)))
                .collect();
            self.key_index.extend(repointed);
        }
        folds
    }

    fn fold(&mut self, a: usize, b: usize) {
        let rank = |i: usize| {
            let identity = &self.identities[i];
            (identity.primary_key.clone(), identity.founding_key.clone())
        };
        let (winner, loser) = if rank(a) <= rank(b) { (a, b) } else { (b, a) };

        let loser_identity = &mut self.identities[loser];
        let keys = std::mem::take(&mut loser_identity.keys);
        let members = std::mem::take(&mut loser_identity.members);
        let mut absorbed = std::mem::take(&mut loser_identity.absorbed);
        absorbed.push(loser_identity.founding_key.clone());
        loser_identity.parent = Some(winner);

        let winner_identity = &mut self.identities[winner];
        debug!(
            "Folding {} into {} (shared structural key)",
            absorbed.last().map(String::as_str).unwrap_or_default(),
            winner_identity.primary_key
        );
        winner_identity.keys.extend(keys);
        winner_identity.members.extend(members);
        winner_identity.members.sort_unstable();
        winner_identity.members.dedup();
        winner_identity.absorbed.extend(absorbed);
        winner_identity.absorbed.sort();
        winner_identity.refresh_primary_key();
    }

    /// Root identities with their arena ids, in creation order.
    pub fn roots(&self) -> impl Iterator<Item = (usize, &Identity<K>)> {
        self.identities
            .iter()
            .enumerate()
            .filter(|(_, identity)| identity.parent.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_key_resolves_to_same_identity() {
        let mut arena: IdentityArena<String> = IdentityArena::new();
        let a = arena.resolve(&["k1".into()], None, 0).unwrap();
        let b = arena.resolve(&["k1".into(), "k2".into()], None, 1).unwrap();
        assert_eq!(a, b);
        assert_eq!(arena.get(a).members, vec![0, 1]);
    }

    #[test]
    fn test_name_and_structural_kept_apart() {
        let mut arena: IdentityArena<String> = IdentityArena::new();
        let structural = arena.resolve(&["quercetin".into()], Some("quercetin"), 0).unwrap();
        let named = arena.resolve(&[], Some("quercetin"), 1).unwrap();
        assert_ne!(structural, named);
        assert!(arena.get(named).by_name);
        assert_eq!(arena.get(named).primary_key, "name:quercetin");
    }

    #[test]
    fn test_reconcile_folds_into_smallest_primary_key() {
        let mut arena: IdentityArena<String> = IdentityArena::new();
        let x = arena.resolve(&["x".into()], None, 0).unwrap();
        let b = arena.resolve(&["b".into()], None, 1).unwrap();
        // Links both: attaches to "x", which now also holds "b".
        arena.resolve(&["x".into(), "b".into()], None, 2).unwrap();
        assert_ne!(arena.find(x), arena.find(b));

        assert_eq!(arena.reconcile(), 1);
        assert_eq!(arena.find(x), arena.find(b));
        let root = arena.get(x);
        assert_eq!(root.primary_key, "b");
        // Reported by the key "x" was created under.
        assert_eq!(root.absorbed, vec!["x".to_string()]);
        assert_eq!(root.members, vec![0, 1, 2]);
        assert_eq!(arena.roots().count(), 1);
        assert_eq!(arena.lookup(&"x".to_string()), Some(arena.find(b)));
    }

    #[test]
    fn test_no_identity_without_keys_or_name() {
        let mut arena: IdentityArena<String> = IdentityArena::new();
        assert!(arena.resolve(&[], None, 0).is_none());
        assert!(arena.resolve(&[], Some(""), 0).is_none());
    }
}
