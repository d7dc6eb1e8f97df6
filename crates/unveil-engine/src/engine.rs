//! The registration engine.
//!
//! [`Reveal`] owns a [`Store`] and the collaborators that feed it. Every
//! `reveal` call resolves its targets, merges configuration into one element
//! record per node, optionally groups the nodes into a sequence, and then arms
//! the initialization trigger. Calls chain, and a chain issued in one burst
//! initializes once.
//!
//! Nothing here returns an error to the caller. Failures are written to the
//! [`Logger`] and the call keeps whatever progress it made.

use crate::config::EngineConfig;
use crate::error::{Result, RevealError};
use crate::initializer::{Initializer, NoopInitializer};
use crate::logger::{Logger, TracingLogger};
use crate::node::{Node, NodeResolver};
use crate::scheduler::Scheduler;
use crate::style::{NoStyles, StyleGenerator};
use crate::trigger::InitTrigger;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_json::{Map, Value};
use std::sync::{Arc, Weak};
use unveil_core::merge::overlay;
use unveil_core::store::parse_marker;
use unveil_core::{
    next_id, Element, HistoryEntry, Sequence, Store, Target, MARKER_ATTRIBUTE,
};

/// The overloaded second argument of [`Reveal::reveal`]: either options or
/// an interval.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RevealArgs {
    #[default]
    Empty,
    Options(Map<String, Value>),
    Interval(i64),
}

impl RevealArgs {
    /// Split into options and effective interval. A numeric second argument
    /// takes the interval's place and leaves the options empty.
    pub fn normalize(self, interval: Option<i64>) -> (Map<String, Value>, Option<i64>) {
        match self {
            RevealArgs::Empty => (Map::new(), interval),
            RevealArgs::Options(options) => (options, interval),
            RevealArgs::Interval(interval) => (Map::new(), Some(interval)),
        }
    }
}

impl From<()> for RevealArgs {
    fn from(_: ()) -> Self {
        RevealArgs::Empty
    }
}

impl From<Map<String, Value>> for RevealArgs {
    fn from(options: Map<String, Value>) -> Self {
        RevealArgs::Options(options)
    }
}

impl From<Option<Map<String, Value>>> for RevealArgs {
    fn from(options: Option<Map<String, Value>>) -> Self {
        options.map_or(RevealArgs::Empty, RevealArgs::Options)
    }
}

impl From<i64> for RevealArgs {
    fn from(interval: i64) -> Self {
        RevealArgs::Interval(interval)
    }
}

impl From<i32> for RevealArgs {
    fn from(interval: i32) -> Self {
        RevealArgs::Interval(interval.into())
    }
}

impl From<Value> for RevealArgs {
    /// Objects become options, numbers become an interval (truncated toward
    /// zero), anything else is treated as absent.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(options) => RevealArgs::Options(options),
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|f| f.trunc() as i64))
                .map_or(RevealArgs::Empty, RevealArgs::Interval),
            _ => RevealArgs::Empty,
        }
    }
}

struct Inner<N: Node> {
    defaults: Map<String, Value>,
    default_container: String,
    store: RwLock<Store<N>>,
    resolver: Arc<dyn NodeResolver<N>>,
    styles: Arc<dyn StyleGenerator<N>>,
    initializer: Arc<dyn Initializer<N>>,
    logger: Arc<dyn Logger>,
    trigger: InitTrigger,
}

/// A reveal engine instance. Cloning yields another handle to the same engine.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use unveil_engine::{ManualScheduler, MemoryDocument, MemoryNode, Reveal};
///
/// let doc = MemoryDocument::new();
/// let body = doc.root().append(MemoryNode::new("body"));
/// body.append(MemoryNode::new("div").with_class("card"));
/// body.append(MemoryNode::new("div").with_class("card"));
///
/// let scheduler = Arc::new(ManualScheduler::new());
/// let reveal = Reveal::builder(doc, scheduler.clone()).build().unwrap();
///
/// reveal.reveal(".card", 200, None).reveal("body", (), None);
///
/// assert_eq!(reveal.store().elements.len(), 3);
/// assert_eq!(reveal.store().sequences.len(), 1);
/// assert_eq!(scheduler.run_pending(), 1);
/// ```
pub struct Reveal<N: Node> {
    inner: Arc<Inner<N>>,
}

impl<N: Node> Clone for Reveal<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N: Node> Reveal<N> {
    /// Start building an engine around a resolver and a scheduler.
    pub fn builder<R, S>(resolver: R, scheduler: Arc<S>) -> RevealBuilder<N>
    where
        R: NodeResolver<N>,
        S: Scheduler,
    {
        RevealBuilder::new(Arc::new(resolver), scheduler)
    }

    /// Register `target` for reveal.
    ///
    /// `options` is either a configuration object or, as a shorthand, the
    /// interval; `interval` (ms, signed) groups all targets of this call into
    /// one sequence when its magnitude exceeds 15.
    pub fn reveal(
        &self,
        target: impl Into<Target<N>>,
        options: impl Into<RevealArgs>,
        interval: Option<i64>,
    ) -> &Self {
        self.reveal_with(target.into(), options.into(), interval, false)
    }

    fn reveal_with(
        &self,
        target: Target<N>,
        args: RevealArgs,
        interval: Option<i64>,
        sync: bool,
    ) -> &Self {
        let (options, interval) = args.normalize(interval);

        if let Err(err) = self.register(target, options, interval, sync) {
            self.inner.logger.log(&err.to_string());
            return self;
        }

        if !sync {
            self.schedule_initialization();
        }

        self
    }

    /// Write the elements, sequence and container for one call, and record
    /// the call in the history unless it is a replay. All of it happens under
    /// one store guard.
    fn register(
        &self,
        target: Target<N>,
        options: Map<String, Value>,
        interval: Option<i64>,
        sync: bool,
    ) -> Result<usize> {
        let descriptor = options
            .get("container")
            .and_then(Value::as_str)
            .unwrap_or(self.inner.default_container.as_str());
        let container = self
            .inner
            .resolver
            .container(descriptor)
            .ok_or_else(|| RevealError::InvalidContainer(descriptor.to_string()))?;

        let targets = self.inner.resolver.targets(&target, &container);
        if targets.is_empty() {
            return Err(RevealError::EmptySelection);
        }

        let mut store = self.inner.store.write();

        let mut sequence = interval
            .filter(|interval| Sequence::qualifies(*interval))
            .map(|interval| Sequence::new(next_id(), interval));

        let container_id = store.find_container(&container).unwrap_or_else(next_id);

        for node in &targets {
            let element =
                self.build_element(&store, node, container_id, sequence.as_mut(), &options);
            node.set_attribute(MARKER_ATTRIBUTE, &element.marker());
            store.insert_element(element);
        }

        if let Some(sequence) = sequence {
            store.insert_sequence(sequence);
        }
        store.insert_container(container_id, container);

        tracing::debug!(%target, count = targets.len(), ?interval, sync, "reveal: registered");
        if !sync {
            store.record(HistoryEntry {
                target,
                options,
                interval,
            });
        }

        Ok(targets.len())
    }

    /// Build (or rebuild) one element. Failures are logged and the element is
    /// returned in whatever state it reached.
    fn build_element(
        &self,
        store: &Store<N>,
        node: &N,
        container_id: u64,
        sequence: Option<&mut Sequence>,
        options: &Map<String, Value>,
    ) -> Element<N> {
        let existing = node
            .attribute(MARKER_ATTRIBUTE)
            .map(|marker| store.element_for_marker(&marker).cloned());

        let mut element = match existing {
            Some(Ok(element)) => element,
            Some(Err(err)) => {
                self.inner.logger.log(&RevealError::from(err).to_string());
                Element::new(next_id(), container_id, node.clone())
            }
            None => Element::new(next_id(), container_id, node.clone()),
        };

        if let Some(sequence) = sequence {
            element.sequence = Some(sequence.push(element.id));
        }

        let mut config = self.inner.defaults.clone();
        overlay(&mut config, &element.config);
        overlay(&mut config, options);
        element.config = config;

        match self.inner.styles.generate(&element) {
            Ok(styles) => element.styles = Some(styles),
            Err(err) => self.inner.logger.log(&RevealError::from(err).to_string()),
        }

        element
    }

    fn schedule_initialization(&self) {
        let weak: Weak<Inner<N>> = Arc::downgrade(&self.inner);
        self.inner.trigger.arm(move |generation| {
            Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if inner.trigger.settle(generation) {
                    Reveal { inner }.initialize();
                }
            })
        });
    }

    fn initialize(&self) {
        tracing::debug!("initialize");
        self.inner.initializer.initialize(self);
    }

    /// Replay every recorded call against the current document, then
    /// initialize immediately.
    ///
    /// Replays neither grow the history nor arm the trigger. Sequences and
    /// containers the replay leaves unreferenced are dropped.
    pub fn sync(&self) -> &Self {
        let history = self.inner.store.read().history.clone();
        for entry in history {
            self.reveal_with(
                entry.target,
                RevealArgs::Options(entry.options),
                entry.interval,
                true,
            );
        }
        self.inner.store.write().rinse();
        self.initialize();
        self
    }

    /// Forget the elements behind `target` and strip their markers.
    ///
    /// Resolution happens within the default container. History is kept, so a
    /// later [`sync`](Reveal::sync) registers matching nodes again.
    pub fn clean(&self, target: impl Into<Target<N>>) -> &Self {
        let target = target.into();
        let Some(container) = self.inner.resolver.container(&self.inner.default_container)
        else {
            let err = RevealError::InvalidContainer(self.inner.default_container.clone());
            self.inner.logger.log(&err.to_string());
            return self;
        };

        let targets = self.inner.resolver.targets(&target, &container);
        if targets.is_empty() {
            self.inner
                .logger
                .log(&RevealError::EmptyCleanSelection.to_string());
            return self;
        }

        let mut store = self.inner.store.write();
        let mut removed = 0;
        for node in &targets {
            let Some(marker) = node.attribute(MARKER_ATTRIBUTE) else {
                continue;
            };
            if let Ok(id) = parse_marker(&marker) {
                if store.remove_element(id).is_some() {
                    removed += 1;
                }
            }
            node.remove_attribute(MARKER_ATTRIBUTE);
        }
        store.rinse();
        tracing::debug!(%target, removed, "clean");

        self
    }

    /// Strip every marker, cancel pending initialization and empty the store.
    pub fn destroy(&self) {
        self.inner.trigger.cancel();
        let mut store = self.inner.store.write();
        for element in store.elements.values() {
            element.node.remove_attribute(MARKER_ATTRIBUTE);
        }
        *store = Store::new();
        tracing::debug!("destroy");
    }

    /// Read access to the store.
    pub fn store(&self) -> RwLockReadGuard<'_, Store<N>> {
        self.inner.store.read()
    }

    /// Write access for the observer (e.g. advancing a sequence's active
    /// window). Do not hold across a `reveal` call.
    pub fn store_mut(&self) -> RwLockWriteGuard<'_, Store<N>> {
        self.inner.store.write()
    }

    /// A detached copy of the store.
    pub fn snapshot(&self) -> Store<N> {
        self.inner.store.read().clone()
    }

    /// The merge base applied to every element.
    pub fn defaults(&self) -> &Map<String, Value> {
        &self.inner.defaults
    }

    pub fn is_initialization_pending(&self) -> bool {
        self.inner.trigger.is_pending()
    }
}

/// Builder for [`Reveal`].
pub struct RevealBuilder<N: Node> {
    config: EngineConfig,
    resolver: Arc<dyn NodeResolver<N>>,
    scheduler: Arc<dyn Scheduler>,
    styles: Arc<dyn StyleGenerator<N>>,
    initializer: Arc<dyn Initializer<N>>,
    logger: Arc<dyn Logger>,
}

impl<N: Node> RevealBuilder<N> {
    pub fn new(resolver: Arc<dyn NodeResolver<N>>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            config: EngineConfig::default(),
            resolver,
            scheduler,
            styles: Arc::new(NoStyles),
            initializer: Arc::new(NoopInitializer),
            logger: Arc::new(TracingLogger),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn styles(mut self, styles: impl StyleGenerator<N>) -> Self {
        self.styles = Arc::new(styles);
        self
    }

    pub fn initializer(mut self, initializer: impl Initializer<N>) -> Self {
        self.initializer = Arc::new(initializer);
        self
    }

    pub fn logger(mut self, logger: impl Logger) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    pub fn build(self) -> Result<Reveal<N>> {
        self.config.validate()?;
        let defaults = self.config.defaults.to_map()?;

        Ok(Reveal {
            inner: Arc::new(Inner {
                default_container: self.config.defaults.container.clone(),
                defaults,
                store: RwLock::new(Store::new()),
                resolver: self.resolver,
                styles: self.styles,
                initializer: self.initializer,
                logger: self.logger,
                trigger: InitTrigger::new(self.scheduler),
            }),
        })
    }
}
