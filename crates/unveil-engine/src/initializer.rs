//! Initialization hook run after a burst of registrations.

use crate::engine::Reveal;
use crate::node::Node;

/// Consumes the store once registration has settled: sets up visibility
/// observation and drives transitions.
///
/// Invoked with no engine lock held, so implementations may read
/// [`Reveal::store`] or call back into the engine.
pub trait Initializer<N: Node>: Send + Sync + 'static {
    fn initialize(&self, engine: &Reveal<N>);
}

impl<N, F> Initializer<N> for F
where
    N: Node,
    F: Fn(&Reveal<N>) + Send + Sync + 'static,
{
    fn initialize(&self, engine: &Reveal<N>) {
        self(engine)
    }
}

/// Initializer that only traces the store size.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopInitializer;

impl<N: Node> Initializer<N> for NoopInitializer {
    fn initialize(&self, engine: &Reveal<N>) {
        let store = engine.store();
        tracing::debug!(
            elements = store.elements.len(),
            containers = store.containers.len(),
            sequences = store.sequences.len(),
            "initialize (noop)"
        );
    }
}
