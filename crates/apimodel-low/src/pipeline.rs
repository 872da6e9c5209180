/*
 * pipeline.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Concurrent node-to-object translation.
 */

//! The translation pipeline.
//!
//! Converts the entries of a mapping node into built objects using three
//! kinds of participants connected by bounded channels:
//!
//! - a single producer ([`feed_mapping_pairs`]) walks the mapping's flat
//!   child list in document order and emits (key, value) pairs, skipping
//!   extension keys,
//! - a pool of workers ([`translate_pipeline`]) resolves and builds each
//!   pair,
//! - a single consumer ([`collect_sequenced`]) inserts results into the
//!   destination [`OrderedMap`]. It is the only writer of that map.
//!
//! Completion order across workers is not synchronized with submission
//! order, so by default the destination map is filled in completion order.
//! With [`BuildConfig::preserve_order`](crate::BuildConfig) every item
//! carries its document position and the consumer releases results through
//! a [`ReorderBuffer`].
//!
//! The first failing item cancels the pipeline's own token; the producer
//! and the remaining workers stop, every channel drains, and the error is
//! returned only after all participants have finished.

use std::collections::BTreeMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::thread;

use apimodel_yaml::Node;
use crossbeam_channel::{Receiver, Sender, bounded};

use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::extensions::{has_extension_prefix_ignore_case, is_extension_key};
use crate::orderedmap::OrderedMap;

/// An item tagged with its submission position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequenced<T> {
    pub seq: usize,
    pub item: T,
}

/// Releases items in submission order.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: usize,
    pending: BTreeMap<usize, T>,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self {
            next: 0,
            pending: BTreeMap::new(),
        }
    }
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept item `seq` and return every item that is now in order.
    pub fn push(&mut self, seq: usize, item: T) -> Vec<T> {
        self.pending.insert(seq, item);
        let mut ready = Vec::new();
        while let Some(item) = self.pending.remove(&self.next) {
            ready.push(item);
            self.next += 1;
        }
        ready
    }

    /// Items still waiting for a gap to fill, in order.
    pub fn finish(self) -> Vec<T> {
        self.pending.into_values().collect()
    }
}

/// Producer: send every non-extension (key, value) pair of `root`.
///
/// Merge keys are expanded first. Only key nodes are tested against the
/// extension prefix, case-insensitively; a matching key is skipped together
/// with its value. Stops early when `cx` is cancelled or the receiving side
/// has gone away.
pub fn feed_mapping_pairs<'a>(
    cx: &BuildContext,
    root: &'a Node,
    input: Sender<Sequenced<(&'a Node, &'a Node)>>,
) {
    let mut seq = 0;
    for (key, value) in root.merged_pairs() {
        if has_extension_prefix_ignore_case(&key.value) {
            if !is_extension_key(&key.value) {
                tracing::debug!(
                    key = %key.value,
                    line = key.line(),
                    column = key.column(),
                    "skipping key with extension prefix in non-canonical case"
                );
            }
            continue;
        }
        if cx.is_cancelled() {
            return;
        }
        let item = Sequenced {
            seq,
            item: (key, value),
        };
        if input.send(item).is_err() {
            return;
        }
        seq += 1;
    }
}

/// Workers: apply `translate` to every input item.
///
/// Runs `cx.config().workers` workers until `input` is closed and drained.
/// The first error is kept, cancels `cx`, and is returned once every worker
/// has stopped. Returns [`BuildError::Cancelled`] if `cx` was cancelled
/// from outside.
pub fn translate_pipeline<In, Out, F>(
    cx: &BuildContext,
    input: Receiver<In>,
    output: Sender<Out>,
    translate: F,
) -> Result<()>
where
    In: Send,
    Out: Send,
    F: Fn(&BuildContext, In) -> Result<Out> + Sync,
{
    let first_error: Mutex<Option<BuildError>> = Mutex::new(None);

    thread::scope(|scope| {
        for _ in 0..cx.config().effective_workers() {
            let input = &input;
            let output = output.clone();
            let translate = &translate;
            let first_error = &first_error;
            scope.spawn(move || {
                for item in input.iter() {
                    if cx.is_cancelled() {
                        break;
                    }
                    match translate(cx, item) {
                        Ok(out) => {
                            if output.send(out).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            let mut slot = first_error
                                .lock()
                                .unwrap_or_else(|poisoned| poisoned.into_inner());
                            if slot.is_none() {
                                *slot = Some(err);
                            }
                            drop(slot);
                            cx.cancellation().cancel();
                            break;
                        }
                    }
                }
            });
        }
    });

    drop(output);
    drop(input);

    let first_error = first_error
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    match first_error {
        Some(err) => Err(err),
        None => cx.check_cancelled(),
    }
}

/// Consumer: insert every delivered entry into a new map.
///
/// `None` items are placeholders for entries that were dropped; they keep
/// the sequence gap-free.
pub fn collect_sequenced<K, V>(
    output: Receiver<Sequenced<Option<(K, V)>>>,
    preserve_order: bool,
) -> OrderedMap<K, V>
where
    K: Hash + Eq,
{
    let mut map = OrderedMap::new();
    if !preserve_order {
        for Sequenced { item, .. } in output.iter() {
            if let Some((key, value)) = item {
                map.set(key, value);
            }
        }
        return map;
    }

    let mut reorder = ReorderBuffer::new();
    for Sequenced { seq, item } in output.iter() {
        for (key, value) in reorder.push(seq, item).into_iter().flatten() {
            map.set(key, value);
        }
    }
    for (key, value) in reorder.finish().into_iter().flatten() {
        map.set(key, value);
    }
    map
}

/// Translate every non-extension entry of the mapping `root`.
///
/// `translate` receives each (key, value) pair on a worker thread and
/// returns the entry to insert, or `None` to drop it. The whole pipeline
/// runs under a child of `cx`, so a failing entry stops its siblings
/// without cancelling the caller.
pub fn translate_mapping<'a, K, V, F>(
    cx: &BuildContext,
    root: &'a Node,
    translate: F,
) -> Result<OrderedMap<K, V>>
where
    K: Hash + Eq + Send,
    V: Send,
    F: Fn(&BuildContext, &'a Node, &'a Node) -> Result<Option<(K, V)>> + Sync,
{
    cx.check_cancelled()?;
    let pipeline_cx = cx.child();
    let capacity = cx.config().effective_capacity();
    let preserve_order = cx.config().preserve_order;

    let (in_tx, in_rx) = bounded(capacity);
    let (out_tx, out_rx) = bounded(capacity);

    let (result, map) = thread::scope(|scope| {
        let producer_cx = &pipeline_cx;
        scope.spawn(move || feed_mapping_pairs(producer_cx, root, in_tx));
        let consumer = scope.spawn(move || collect_sequenced(out_rx, preserve_order));

        let result = translate_pipeline(
            &pipeline_cx,
            in_rx,
            out_tx,
            |cx, Sequenced { seq, item: (key, value) }| {
                translate(cx, key, value).map(|item| Sequenced { seq, item })
            },
        );

        match consumer.join() {
            Ok(map) => (result, map),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    });

    result.map(|()| map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BuildConfig;
    use apimodel_yaml::parse;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn context(workers: usize, preserve_order: bool) -> BuildContext {
        BuildContext::with_config(
            BuildConfig::default()
                .with_workers(workers)
                .with_channel_capacity(1)
                .with_preserve_order(preserve_order),
        )
    }

    #[test]
    fn test_reorder_buffer_releases_in_order() {
        let mut buffer = ReorderBuffer::new();
        assert!(buffer.push(2, "c").is_empty());
        assert!(buffer.push(1, "b").is_empty());
        assert_eq!(buffer.push(0, "a"), vec!["a", "b", "c"]);
        assert!(buffer.push(4, "e").is_empty());
        assert_eq!(buffer.finish(), vec!["e"]);
    }

    #[test]
    fn test_producer_skips_extension_keys_only() {
        let root = parse("/a: x-value\nx-skip: 1\nX-Skip: 2\n/b: 3\n").unwrap();
        let (tx, rx) = bounded(16);
        feed_mapping_pairs(&BuildContext::new(), &root, tx);
        let keys: Vec<(usize, String, String)> = rx
            .iter()
            .map(|s| (s.seq, s.item.0.value.clone(), s.item.1.value.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (0, "/a".to_string(), "x-value".to_string()),
                (1, "/b".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_producer_stops_when_cancelled() {
        let root = parse("a: 1\nb: 2").unwrap();
        let cx = BuildContext::new();
        cx.cancellation().cancel();
        let (tx, rx) = bounded(16);
        feed_mapping_pairs(&cx, &root, tx);
        assert_eq!(rx.iter().count(), 0);
    }

    #[test]
    fn test_translate_mapping_builds_every_entry() {
        let root = parse("a: 1\nb: 2\nx-c: 3\nd: 4\n").unwrap();
        let map = translate_mapping(&context(3, false), &root, |_, k, v| {
            Ok(Some((k.value.clone(), v.value.parse::<i32>().unwrap_or(0))))
        })
        .unwrap();

        let mut entries: Vec<(String, i32)> =
            map.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort();
        assert_eq!(
            entries,
            vec![("a".into(), 1), ("b".into(), 2), ("d".into(), 4)]
        );
    }

    #[test]
    fn test_preserve_order_follows_document() {
        let yaml: String = (0..40).map(|i| format!("k{:02}: {}\n", i, i)).collect();
        let root = parse(&yaml).unwrap();
        let map = translate_mapping(&context(4, true), &root, |_, k, v| {
            // Uneven work so completion order scrambles
            let n: u64 = v.value.parse().unwrap_or(0);
            thread::sleep(std::time::Duration::from_millis((40 - n) % 7));
            Ok(Some((k.value.clone(), n)))
        })
        .unwrap();

        let keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
        let expected: Vec<String> = (0..40).map(|i| format!("k{:02}", i)).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_dropped_entries_do_not_stall_reordering() {
        let root = parse("a: 1\nb: 2\nc: 3\n").unwrap();
        let map = translate_mapping(&context(2, true), &root, |_, k, _| {
            if k.value == "b" {
                Ok(None)
            } else {
                Ok(Some((k.value.clone(), ())))
            }
        })
        .unwrap();
        let keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_first_error_stops_pipeline_and_drains() {
        let yaml: String = (0..200).map(|i| format!("k{}: {}\n", i, i)).collect();
        let root = parse(&yaml).unwrap();
        let built = AtomicUsize::new(0);
        let parent = context(4, false);

        let err = translate_mapping(&parent, &root, |_, k, v| {
            if k.value == "k3" {
                return Err(BuildError::unresolvable("#/boom", v));
            }
            built.fetch_add(1, Ordering::SeqCst);
            Ok(Some((k.value.clone(), ())))
        })
        .unwrap_err();

        assert!(matches!(err, BuildError::UnresolvableReference { ref reference, .. } if reference == "#/boom"));
        assert!(built.load(Ordering::SeqCst) < 199);
        // the failure cancels the pipeline, never the caller
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_external_cancellation_is_reported() {
        let root = parse("a: 1\nb: 2\n").unwrap();
        let cx = context(2, false);
        cx.cancellation().cancel();
        let err = translate_mapping(&cx, &root, |_, k, _| Ok(Some((k.value.clone(), ()))))
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_cancel_during_run() {
        let yaml: String = (0..50).map(|i| format!("k{}: {}\n", i, i)).collect();
        let root = parse(&yaml).unwrap();
        let cx = context(2, false);
        let err = translate_mapping(&cx, &root, |_, k, _| {
            if k.value == "k5" {
                cx.cancellation().cancel();
            }
            Ok(Some((k.value.clone(), ())))
        })
        .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_empty_mapping() {
        let root = parse("{}").unwrap();
        let map: OrderedMap<String, ()> =
            translate_mapping(&context(2, false), &root, |_, k, _| Ok(Some((k.value.clone(), ()))))
                .unwrap();
        assert!(map.is_empty());
    }
}
