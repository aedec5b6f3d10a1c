//! The [`Actor`] trait and per-actor execution context.

use std::future::Future;

use crate::addr::{ActorId, Addr};
use crate::system::ActorSystem;

/// A unit of isolated state driven by messages.
///
/// The runtime calls the hooks in a fixed order: `started` once before
/// the first message, `handle` once per delivered message (strictly
/// sequentially — no reentrancy), `stopping` at most once when the actor
/// exits for any reason (explicit stop, panic, system shutdown).
pub trait Actor: Send + 'static {
    /// The message set this actor accepts.
    type Msg: Send + 'static;

    /// Runs once, before any message is delivered. Use it to spawn
    /// children or start tickers — the context exposes the actor's own
    /// address.
    fn started(&mut self, _ctx: &mut Context<Self::Msg>) {}

    /// Processes one message. Implement with a plain `async fn`; the
    /// `Send` bound is what lets the runtime drive any actor on the
    /// multi-threaded executor.
    fn handle(
        &mut self,
        ctx: &mut Context<Self::Msg>,
        msg: Self::Msg,
    ) -> impl Future<Output = ()> + Send;

    /// Runs once when the actor is shutting down, before it is removed
    /// from the registry. Messages still in the mailbox are discarded.
    fn stopping(&mut self, _ctx: &mut Context<Self::Msg>) {}
}

/// Handle to the runtime from inside an actor's hooks.
pub struct Context<M> {
    addr: Addr<M>,
    system: ActorSystem,
    pub(crate) stop: bool,
}

impl<M: Send + 'static> Context<M> {
    pub(crate) fn new(addr: Addr<M>, system: ActorSystem) -> Self {
        Self {
            addr,
            system,
            stop: false,
        }
    }

    /// This actor's own ID.
    pub fn id(&self) -> ActorId {
        self.addr.id()
    }

    /// This actor's own address, for handing to children or timers.
    pub fn addr(&self) -> Addr<M> {
        self.addr.clone()
    }

    /// The actor system, for spawning children.
    pub fn system(&self) -> &ActorSystem {
        &self.system
    }

    /// Requests a stop after the current message completes. Idempotent.
    pub fn stop_self(&mut self) {
        self.stop = true;
    }
}
