// Copyright 2021 by Michael Thies <mail@mhthies.de>
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except in compliance with
// the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the License for the
// specific language governing permissions and limitations under the License.

//! This module provides a generic three-tier parallel tree search: a master distributes nodes to a
//! number of hubs, each hub feeds its own pool of worker threads, and the workers expand nodes
//! depth-first on private stacks.
//!
//! Work flows down from the master queue through the hub queues onto the worker stacks, and
//! surplus work flows back up:
//! a worker whose stack outgrows the spill threshold returns half of it to its hub, and a hub
//! whose queue outgrows the threshold while all its workers are saturated returns half of the
//! surplus to the master. This keeps nodes reachable for idle siblings while bounding queue
//! memory.
//!
//! Termination is detected by the master with a single task counter: it starts at 1 for the root
//! node, grows by one for every node a hub hands back, and shrinks by the accepted-node count a
//! hub reports when its subtree has drained. When the counter reaches zero, no node is alive
//! anywhere; the master broadcasts [Message::Done] and collects the terminal nodes gathered by
//! each subtree.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Select, Sender, TryRecvError};
use log::debug;

/// A node of the search tree. The engine never looks inside a node; it only needs to know
/// whether the node is a leaf (a solution to be collected) or must be expanded further.
pub trait Node {
    fn terminal(&self) -> bool;
}

/// A tree search model: the initial node plus the rule to expand a node into its children.
///
/// The model is shared read-only between all worker threads, so expansion must not rely on
/// interior mutability.
pub trait Model: Send + Sync + 'static {
    type Node: Node + Send + 'static;

    /// The root node of the search tree.
    fn root(&self) -> Self::Node;

    /// Expand a node into its children. Terminal children are collected as solutions,
    /// non-terminal children are searched further. An empty result abandons the branch.
    fn expand(&self, node: Self::Node) -> Vec<Self::Node>;
}

/// The messages exchanged between the tiers of the engine.
///
/// Each channel consumer expects specific kinds in specific protocol states; an unexpected kind
/// is a programming error and aborts the search with a panic. A disconnected channel is treated
/// like a received [Message::Done].
pub enum Message<N> {
    /// A search tree node, handed down as work or handed back up as surplus.
    Node(N),
    /// The sender's subtree has run out of work. Hubs report how many nodes they accepted from
    /// the master since their last idle report, so the master can retire exactly that amount
    /// from its task counter; workers report no count.
    Idle(Option<u64>),
    /// The sender has picked up work after being idle.
    Busy,
    /// Shut down: stop accepting work, drain and report answers.
    Done,
    /// All terminal nodes collected in the sender's subtree. Sent exactly once, as the sender's
    /// last message.
    Answers(Vec<N>),
}

impl<N> Message<N> {
    /// Name of the message kind, for protocol violation diagnostics.
    fn kind(&self) -> &'static str {
        match self {
            Message::Node(_) => "NODE",
            Message::Idle(_) => "IDLE",
            Message::Busy => "BUSY",
            Message::Done => "DONE",
            Message::Answers(_) => "ANSWERS",
        }
    }
}

/// Search the complete tree of the given model in parallel and return all terminal nodes.
///
/// `hub_division` configures the process tree: each entry spawns one hub, the entry's value is
/// that hub's worker thread count. `max_len` is the spill threshold for worker stacks and hub
/// queues (see module docs).
///
/// The set of returned nodes is a function of the model alone, their order is not: the parallel
/// schedule decides which worker reaches which leaf first.
pub fn solve<M: Model>(model: Arc<M>, hub_division: &[usize], max_len: usize) -> Vec<M::Node> {
    assert!(
        !hub_division.is_empty(),
        "the hub division must name at least one hub"
    );

    let (queue_tx, queue_rx) = unbounded();
    let mut hub_feeds = Vec::with_capacity(hub_division.len());
    let mut hubs = Vec::with_capacity(hub_division.len());
    for (i, &num_workers) in hub_division.iter().enumerate() {
        assert!(num_workers > 0, "hub {} has no workers", i);
        let (feed_tx, feed_rx) = unbounded();
        let model = model.clone();
        let queue_rx = queue_rx.clone();
        let handle = thread::Builder::new()
            .name(format!("hub {}", i))
            .spawn(move || hub(model, i, queue_rx, feed_tx, num_workers, max_len))
            .expect("failed to spawn hub thread");
        hub_feeds.push(feed_rx);
        hubs.push(handle);
    }

    queue_tx
        .send(Message::Node(model.root()))
        .expect("no hub is listening on the task queue");

    // Every node alive anywhere in the tree is accounted for here: +1 for the root and for each
    // node a hub returns, -k for each hub idle report carrying k accepted nodes.
    let mut tasks_busy: i64 = 1;
    let mut idle_hubs = hub_division.len();
    while tasks_busy > 0 {
        // Block until any hub has reported, then poll all of them.
        let mut sel = Select::new();
        for feed in hub_feeds.iter() {
            sel.recv(feed);
        }
        sel.ready();

        for (i, feed) in hub_feeds.iter().enumerate() {
            match feed.try_recv() {
                Ok(Message::Node(node)) => {
                    queue_tx
                        .send(Message::Node(node))
                        .expect("no hub is listening on the task queue");
                    tasks_busy += 1;
                }
                Ok(Message::Idle(accepted)) => {
                    let accepted =
                        accepted.expect("hub idle report without an accepted-node count") as i64;
                    idle_hubs += 1;
                    tasks_busy -= accepted;
                    debug_assert!(
                        tasks_busy >= 0,
                        "task counter went negative ({}) after hub {} retired {} nodes",
                        tasks_busy,
                        i,
                        accepted
                    );
                    debug!(
                        "Hub {} went idle after {} nodes; {} nodes remain in flight",
                        i, accepted, tasks_busy
                    );
                }
                Ok(Message::Busy) => {
                    idle_hubs -= 1;
                }
                Ok(other) => panic!("wrong signal from hub {}: {}", i, other.kind()),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    panic!("hub {} terminated before reporting answers", i)
                }
            }
        }
    }

    debug!("Search tree consumed; draining {} hubs", hubs.len());
    for _ in hubs.iter() {
        queue_tx
            .send(Message::Done)
            .expect("no hub is listening on the task queue");
    }

    let mut answers = Vec::new();
    for (i, feed) in hub_feeds.iter().enumerate() {
        match feed.recv() {
            Ok(Message::Answers(mut a)) => answers.append(&mut a),
            Ok(other) => panic!(
                "wrong signal from hub {}: expected ANSWERS, got {}",
                i,
                other.kind()
            ),
            Err(_) => panic!("hub {} terminated before reporting answers", i),
        }
    }
    for handle in hubs {
        handle.join().expect("hub thread panicked");
    }

    answers
}

/// Hub main loop: pull nodes from the master queue into the local worker queue, track how many
/// nodes of the own subtree are unresolved, hand surplus back to the master and report idleness
/// upward.
fn hub<M: Model>(
    model: Arc<M>,
    index: usize,
    master_queue: Receiver<Message<M::Node>>,
    master_feed: Sender<Message<M::Node>>,
    num_workers: usize,
    max_len: usize,
) {
    let (work_tx, work_rx) = unbounded();
    let mut worker_feeds = Vec::with_capacity(num_workers);
    let mut workers = Vec::with_capacity(num_workers);
    for i in 0..num_workers {
        let (feed_tx, feed_rx) = unbounded();
        let model = model.clone();
        let work_rx = work_rx.clone();
        let handle = thread::Builder::new()
            .name(format!("worker {}.{}", index, i))
            .spawn(move || worker(model, work_rx, feed_tx, max_len))
            .expect("failed to spawn worker thread");
        worker_feeds.push(feed_rx);
        workers.push(handle);
    }

    let mut idle = true;
    let mut idle_workers = num_workers;
    // Nodes of this hub's subtree that are not resolved yet (queued or inside a worker).
    let mut tasks_busy: usize = 0;
    // Nodes taken from the master queue since the last idle report.
    let mut tasks_accepted: u64 = 0;
    let mut answers: Vec<M::Node> = Vec::new();

    'main: loop {
        // Block until the master queue or any worker feed has a message, then poll everything
        // once. The master queue is shared with the sibling hubs, so a ready message may be
        // gone again by the time we poll; the next round will block again.
        let mut sel = Select::new();
        sel.recv(&master_queue);
        for feed in worker_feeds.iter() {
            sel.recv(feed);
        }
        sel.ready();

        match master_queue.try_recv() {
            Ok(Message::Node(node)) => {
                if work_tx.send(Message::Node(node)).is_err() {
                    break 'main;
                }
                tasks_accepted += 1;
                tasks_busy += 1;
                if idle {
                    if master_feed.send(Message::Busy).is_err() {
                        return;
                    }
                    idle = false;
                }
            }
            Ok(Message::Done) => break 'main,
            Ok(other) => panic!("wrong signal from master: {}", other.kind()),
            Err(TryRecvError::Empty) => {}
            // A vanished master queue means the caller tore the search down.
            Err(TryRecvError::Disconnected) => break 'main,
        }

        for (i, feed) in worker_feeds.iter().enumerate() {
            match feed.try_recv() {
                Ok(Message::Node(node)) => {
                    if work_tx.send(Message::Node(node)).is_err() {
                        break 'main;
                    }
                    tasks_busy += 1;
                }
                Ok(Message::Idle(_)) => {
                    idle_workers += 1;
                    tasks_busy -= 1;
                }
                Ok(Message::Busy) => {
                    idle_workers -= 1;
                }
                Ok(Message::Answers(mut a)) => answers.append(&mut a),
                Ok(other) => panic!(
                    "wrong signal from worker {}.{}: {}",
                    index,
                    i,
                    other.kind()
                ),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    panic!("worker {}.{} terminated unexpectedly", index, i)
                }
            }
        }

        if !idle && tasks_busy == 0 {
            debug!(
                "Hub {} subtree drained, {}/{} workers idle",
                index, idle_workers, num_workers
            );
            if master_feed
                .send(Message::Idle(Some(tasks_accepted)))
                .is_err()
            {
                return;
            }
            tasks_accepted = 0;
            idle = true;
        }

        // Backpressure: while all workers are saturated, hand surplus queued nodes back to the
        // master so idle sibling hubs can take them. The queue length reading is approximate
        // (workers pop concurrently), so the loop simply stops when the queue runs dry early.
        if tasks_busy > num_workers && work_rx.len() > max_len {
            for _ in 0..max_len / 2 {
                match work_rx.try_recv() {
                    Ok(Message::Node(node)) => {
                        tasks_busy -= 1;
                        if master_feed.send(Message::Node(node)).is_err() {
                            return;
                        }
                    }
                    _ => break,
                }
            }
        }
    }

    // Drain: stop the workers and collect their answers. Late state reports that raced the
    // shutdown are skipped; each worker's final message must be its answer list.
    for _ in 0..num_workers {
        if work_tx.send(Message::Done).is_err() {
            break;
        }
    }
    for (i, feed) in worker_feeds.iter().enumerate() {
        loop {
            match feed.recv() {
                Ok(Message::Answers(mut a)) => {
                    answers.append(&mut a);
                    break;
                }
                Ok(Message::Idle(_)) | Ok(Message::Busy) | Ok(Message::Node(_)) => {}
                Ok(other) => panic!(
                    "wrong signal from worker {}.{}: expected ANSWERS, got {}",
                    index,
                    i,
                    other.kind()
                ),
                Err(_) => panic!(
                    "worker {}.{} terminated before reporting answers",
                    index, i
                ),
            }
        }
    }
    let _ = master_feed.send(Message::Answers(answers));
    for handle in workers {
        handle.join().expect("worker thread panicked");
    }
}

/// Worker main loop: pop nodes from the private stack and expand them, collecting terminal
/// children and pushing the rest. The stack keeps the search depth-first; half of it is returned
/// to the hub whenever it outgrows the spill threshold.
fn worker<M: Model>(
    model: Arc<M>,
    queue: Receiver<Message<M::Node>>,
    feed: Sender<Message<M::Node>>,
    max_stack: usize,
) {
    let mut stack: Vec<M::Node> = Vec::new();
    let mut answers: Vec<M::Node> = Vec::new();
    let mut expanded: u64 = 0;
    loop {
        match queue.recv() {
            Ok(Message::Node(node)) => {
                stack.push(node);
                if feed.send(Message::Busy).is_err() {
                    return;
                }

                // Don't bother the hub queue while there is local work.
                while let Some(node) = stack.pop() {
                    expanded += 1;
                    for child in model.expand(node) {
                        if child.terminal() {
                            answers.push(child);
                        } else {
                            stack.push(child);
                        }
                    }

                    if stack.len() > max_stack {
                        let surplus = stack.len() / 2;
                        debug!("Returning {} surplus nodes to the hub", surplus);
                        for _ in 0..surplus {
                            let node = match stack.pop() {
                                Some(node) => node,
                                None => break,
                            };
                            if feed.send(Message::Node(node)).is_err() {
                                return;
                            }
                        }
                    }
                }

                if feed.send(Message::Idle(None)).is_err() {
                    return;
                }
            }
            Ok(Message::Done) | Err(_) => break,
            Ok(other) => panic!("wrong signal from hub: {}", other.kind()),
        }
    }

    debug!("Worker drained after expanding {} nodes", expanded);
    let _ = feed.send(Message::Answers(answers));
}

// =============================================================================
// Tests
#[cfg(test)]
mod tests {
    use super::{Model, Node};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    /// Toy model enumerating every bit string of a fixed length. Each inner node branches on the
    /// next position; a node of full length is re-emitted once as a terminal child.
    struct BitStrings {
        len: usize,
    }

    struct BitNode {
        bits: Vec<bool>,
        terminal: bool,
    }

    impl Node for BitNode {
        fn terminal(&self) -> bool {
            self.terminal
        }
    }

    impl Model for BitStrings {
        type Node = BitNode;

        fn root(&self) -> BitNode {
            BitNode {
                bits: Vec::new(),
                terminal: false,
            }
        }

        fn expand(&self, node: BitNode) -> Vec<BitNode> {
            if node.bits.len() == self.len {
                return vec![BitNode {
                    bits: node.bits,
                    terminal: true,
                }];
            }
            let mut with_one = node.bits.clone();
            with_one.push(true);
            let mut with_zero = node.bits;
            with_zero.push(false);
            vec![
                BitNode {
                    bits: with_zero,
                    terminal: false,
                },
                BitNode {
                    bits: with_one,
                    terminal: false,
                },
            ]
        }
    }

    fn collect(division: &[usize], max_len: usize, len: usize) -> Vec<Vec<bool>> {
        super::solve(Arc::new(BitStrings { len }), division, max_len)
            .into_iter()
            .map(|node| node.bits)
            .collect()
    }

    #[test]
    fn test_single_worker() {
        let leaves = collect(&[1], 10, 6);
        assert_eq!(leaves.len(), 64);
        let distinct: BTreeSet<Vec<bool>> = leaves.into_iter().collect();
        assert_eq!(distinct.len(), 64);
    }

    #[test]
    fn test_hub_division_equivalence() {
        let reference: BTreeSet<Vec<bool>> = collect(&[1], 10, 7).into_iter().collect();
        assert_eq!(reference.len(), 128);

        for division in [vec![2], vec![2, 3], vec![4, 4, 2]].iter() {
            let leaves = collect(division, 10, 7);
            assert_eq!(
                leaves.len(),
                128,
                "hub division {:?} duplicated or lost leaves",
                division
            );
            let distinct: BTreeSet<Vec<bool>> = leaves.into_iter().collect();
            assert_eq!(distinct, reference);
        }
    }

    #[test]
    fn test_tiny_spill_threshold() {
        // A threshold of 1 forces constant node returns through all tiers.
        let leaves = collect(&[2, 2], 1, 6);
        assert_eq!(leaves.len(), 64);
        let distinct: BTreeSet<Vec<bool>> = leaves.into_iter().collect();
        assert_eq!(distinct.len(), 64);
    }
}
