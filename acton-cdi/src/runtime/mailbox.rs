/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fmt;
use std::future::Future;

use tokio::sync::mpsc::{channel, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, instrument, trace};

use crate::common::config::CONFIG;
use crate::handler::BoundDispatcher;
use crate::traits::Message;

/// The mailbox loop could not accept a message or did not finish cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailboxError {
    /// The receive loop has stopped; the message was not delivered.
    Closed,
    /// The receive loop panicked or was aborted.
    TaskFailed(String),
}

impl fmt::Display for MailboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("Mailbox is closed"),
            Self::TaskFailed(reason) => write!(f, "Receive loop failed: {reason}"),
        }
    }
}

impl std::error::Error for MailboxError {}

/// Handle to a dispatcher running on its own task.
///
/// Messages are processed one at a time, in send order. Dropping the handle closes the
/// mailbox; the loop finishes the queued messages and exits.
pub struct ReceiveHandle<A> {
    outbox: Sender<Box<dyn Message>>,
    cancellation_token: CancellationToken,
    tracker: TaskTracker,
    task: JoinHandle<BoundDispatcher<A>>,
}

impl<A> fmt::Debug for ReceiveHandle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiveHandle")
            .field("closed", &self.outbox.is_closed())
            .field("cancelled", &self.cancellation_token.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Runs `dispatcher` on a tokio task fed by a bounded channel.
///
/// A `capacity` of zero uses `mailbox.capacity` from the configuration. Dispatch errors are
/// logged at `error` and the loop moves on to the next message.
///
/// Must be called from within a tokio runtime.
pub fn spawn_receive<A: Send + 'static>(
    dispatcher: BoundDispatcher<A>,
    capacity: usize,
) -> ReceiveHandle<A> {
    let capacity = match capacity {
        0 => CONFIG.mailbox.capacity.max(1),
        requested => requested,
    };
    let (outbox, inbox) = channel(capacity);
    let cancellation_token = CancellationToken::new();
    let tracker = TaskTracker::new();
    let task = tracker.spawn(receive_loop(dispatcher, inbox, cancellation_token.clone()));
    tracker.close();

    ReceiveHandle {
        outbox,
        cancellation_token,
        tracker,
        task,
    }
}

#[instrument(skip_all, fields(class = dispatcher.table().class().name()))]
async fn receive_loop<A: Send + 'static>(
    mut dispatcher: BoundDispatcher<A>,
    mut inbox: Receiver<Box<dyn Message>>,
    cancellation_token: CancellationToken,
) -> BoundDispatcher<A> {
    loop {
        tokio::select! {
            biased;
            () = cancellation_token.cancelled() => {
                trace!("receive loop cancelled");
                break;
            }
            incoming = inbox.recv() => {
                let Some(message) = incoming else {
                    trace!("mailbox closed; receive loop finished");
                    break;
                };
                if let Err(dispatch_error) = dispatcher.dispatch(&*message) {
                    error!(
                        error = %dispatch_error,
                        handler = %dispatch_error.handler(),
                        "dispatch failed"
                    );
                }
            }
        }
    }
    dispatcher
}

impl<A: Send + 'static> ReceiveHandle<A> {
    /// Queues `message`, waiting for mailbox capacity.
    ///
    /// # Errors
    ///
    /// [`MailboxError::Closed`] if the receive loop has stopped.
    pub async fn send(&self, message: impl Message) -> Result<(), MailboxError> {
        self.outbox
            .send(Box::new(message) as Box<dyn Message>)
            .await
            .map_err(|_| MailboxError::Closed)
    }

    /// Closes the mailbox, waits for the queued messages to be handled and returns the
    /// dispatcher.
    ///
    /// # Errors
    ///
    /// [`MailboxError::TaskFailed`] if the loop panicked.
    pub async fn stop(self) -> Result<BoundDispatcher<A>, MailboxError> {
        let Self {
            outbox,
            tracker,
            task,
            ..
        } = self;
        drop(outbox);
        let dispatcher = task
            .await
            .map_err(|join_error| MailboxError::TaskFailed(join_error.to_string()))?;
        tracker.wait().await;
        Ok(dispatcher)
    }

    /// Stops after the message currently being handled, discarding the rest of the queue,
    /// and returns the dispatcher.
    ///
    /// The loop is signalled when `cancel` is called, not when the returned future is first
    /// polled.
    ///
    /// # Errors
    ///
    /// [`MailboxError::TaskFailed`] if the loop panicked.
    pub fn cancel(self) -> impl Future<Output = Result<BoundDispatcher<A>, MailboxError>> {
        self.cancellation_token.cancel();
        self.stop()
    }
}
