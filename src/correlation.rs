//! Request-scoped correlation identifiers
//!
//! Every inbound message is handled inside its own [`Scope`]. The scope is passed
//! explicitly down the call chain (dispatcher, reconcilers, registry client) and is
//! rendered as a prefix on every log line written while handling that message. Work
//! deferred to another thread takes a clone of the scope with it, so concurrently
//! handled messages can never see each other's identifier.

use std::fmt;

use crate::helpers::rand_hex;

const ID_BYTES: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn generate() -> Self {
        CorrelationId(rand_hex(ID_BYTES))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unit of work, optionally tagged with a correlation identifier
///
/// `Display` renders the log prefix, e.g. `[correlationId:4f1c...] `, or nothing when
/// no identifier is bound. Log lines are therefore written as `log::info!("{scope}...")`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scope {
    id: Option<CorrelationId>,
}

impl Scope {
    /// Scope without an identifier
    pub fn none() -> Self {
        Scope::default()
    }

    /// Runs `f` inside a scope bound to `id`
    ///
    /// The caller's own scope value is untouched, so nesting only shadows the
    /// identifier for the subtree that `f` reaches.
    pub fn run<F, T>(id: CorrelationId, f: F) -> T
    where
        F: FnOnce(&Scope) -> T,
    {
        let scope = Scope { id: Some(id) };
        f(&scope)
    }

    pub fn current(&self) -> Option<&CorrelationId> {
        self.id.as_ref()
    }

    /// Runs `f` on a new thread that stays inside this scope
    #[cfg(test)]
    pub fn spawn<F, T>(&self, f: F) -> std::thread::JoinHandle<T>
    where
        F: FnOnce(Scope) -> T + Send + 'static,
        T: Send + 'static,
    {
        let scope = self.clone();
        std::thread::spawn(move || f(scope))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "[correlationId:{id}] "),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    use regex::Regex;

    #[test]
    fn generated_ids_are_fixed_width_hex() {
        let pattern = Regex::new(r"^[0-9a-f]{32}$").unwrap();
        let id = CorrelationId::generate();
        assert!(pattern.is_match(id.as_str()));
        assert_ne!(id, CorrelationId::generate());
    }

    #[test]
    fn prefix_is_omitted_without_scope() {
        assert_eq!(Scope::none().to_string(), "");
        assert_eq!(Scope::none().current(), None);
    }

    #[test]
    fn prefix_carries_the_bound_id() {
        let id = CorrelationId::generate();
        let rendered = Scope::run(id.clone(), |scope| format!("{scope}hello"));
        assert_eq!(rendered, format!("[correlationId:{id}] hello"));
    }

    #[test]
    fn nested_run_only_shadows_its_subtree() {
        let outer = CorrelationId::generate();
        let inner = CorrelationId::generate();

        Scope::run(outer.clone(), |outer_scope| {
            let seen_inside = Scope::run(inner.clone(), |inner_scope| inner_scope.current().cloned());
            assert_eq!(seen_inside, Some(inner.clone()));
            assert_eq!(outer_scope.current(), Some(&outer));
        });
    }

    #[test]
    fn deferred_work_keeps_the_scope() {
        let id = CorrelationId::generate();
        let seen = Scope::run(id.clone(), |scope| {
            scope
                .spawn(|deferred| {
                    thread::sleep(std::time::Duration::from_millis(20));
                    deferred.current().cloned()
                })
                .join()
                .unwrap()
        });
        assert_eq!(seen, Some(id));
    }

    #[test]
    fn concurrent_scopes_do_not_leak() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let scope = Scope::run(CorrelationId::generate(), Scope::clone);
                let expected = scope.current().cloned();
                scope.spawn(move |deferred| {
                    for _ in 0..100 {
                        assert_eq!(deferred.current().cloned(), expected);
                        thread::yield_now();
                    }
                    expected
                })
            })
            .collect();

        let ids: std::collections::HashSet<_> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 8);
    }
}
