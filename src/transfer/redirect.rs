//! Forwarding of a contact's events to another container
//!
//! Once a contact is redirected, its moves and releases are delivered to the redirect target instead
//! of the container the contact started on. The register of the contact owns a [`RedirectContext`]
//! describing what the redirect is about. While an event is forwarded, the context is moved out of
//! the register into the dispatch frame and put back afterwards, unless the redirect was re-pointed or
//! cancelled in the meantime.

use std::mem;

use tracing::{debug, trace};

use crate::{
    input::{ContactId, PointerArbiter},
    shell::{Container, ContainerHandle},
    utils::Arena,
};

use super::IconHandle;

/// Direction of a cross-container move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the left neighbour page
    Left,
    /// Towards the right neighbour page
    Right,
    /// Towards the tab bar
    Up,
    /// Towards the quick-launch bar
    Down,
}

/// What a redirect is about
#[derive(Debug, PartialEq)]
pub enum RedirectContext {
    /// An icon is dragged out of `source`
    Transfer {
        /// The dragged icon
        icon: IconHandle,
        /// Container the icon was dragged out of
        source: ContainerHandle,
        /// Direction the contact left `source` in
        direction: Direction,
    },
    /// A horizontal pan of the pages
    Pan {
        /// Pan anchor when the gesture started
        start_anchor: f64,
    },
}

/// Redirect state of a contact register
#[derive(Debug, Default)]
pub(crate) enum RedirectStatus {
    #[default]
    None,
    Active {
        target: ContainerHandle,
        context: RedirectContext,
    },
    /// The context is lent to the dispatch frame of a forwarded event
    Dispatching { target: ContainerHandle },
}

impl RedirectStatus {
    pub(crate) fn target(&self) -> Option<ContainerHandle> {
        match self {
            RedirectStatus::None => None,
            RedirectStatus::Active { target, .. } | RedirectStatus::Dispatching { target } => Some(*target),
        }
    }
}

/// Failures of event forwarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RedirectError {
    /// The redirect target was destroyed while the contact was redirected
    #[error("redirect target {0:?} does not exist anymore")]
    TargetMissing(ContainerHandle),
    /// The contact is not redirected
    #[error("contact {0:?} is not redirected")]
    NotRedirecting(ContactId),
}

impl PointerArbiter {
    /// Context of the redirect of `contact`, unless it is currently lent out
    pub fn redirect_context(&self, contact: ContactId) -> Option<&RedirectContext> {
        match &self.get(contact)?.redirect {
            RedirectStatus::Active { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Redirect the events of `contact` to `target`
    ///
    /// Fails if the contact is already redirected to another container still present in
    /// `containers`. A redirect to a destroyed container counts as no redirect at all. A context
    /// stored by a previous redirect to the same target is dropped.
    pub fn redirect_to(
        &mut self,
        contact: ContactId,
        target: ContainerHandle,
        context: RedirectContext,
        containers: &Arena<Container>,
    ) -> bool {
        let Some(register) = self.register_mut(contact) else {
            return false;
        };
        if let Some(current) = register.redirect.target() {
            if !containers.contains(current) {
                trace!(?contact, ?current, "replacing redirect to a destroyed container");
            } else if current != target {
                debug!(?contact, ?current, ?target, "contact is already redirected elsewhere");
                return false;
            }
        }
        debug!(?contact, ?target, ?context, "redirecting contact");
        register.redirect = RedirectStatus::Active { target, context };
        register.cancel_marked = false;
        true
    }

    /// Re-point the redirect of `contact` from `current` to `new`
    ///
    /// Redirecting back to the container the contact started on cancels the redirect.
    pub fn change_redirect_to(
        &mut self,
        contact: ContactId,
        current: ContainerHandle,
        new: ContainerHandle,
        context: RedirectContext,
    ) -> bool {
        let Some(register) = self.register_mut(contact) else {
            return false;
        };
        if register.redirect.target() != Some(current) {
            trace!(?contact, ?current, "redirect target changed meanwhile");
            return false;
        }
        register.cancel_marked = false;
        if new == register.origin() {
            debug!(?contact, ?current, "redirect back to origin, cancelling");
            register.redirect = RedirectStatus::None;
        } else {
            debug!(?contact, ?current, ?new, "re-pointing redirect");
            register.redirect = RedirectStatus::Active { target: new, context };
        }
        true
    }

    /// Stop redirecting `contact`, dropping its context
    ///
    /// A `deferred` cancellation only marks the register, the context is dropped by
    /// [`flush_deferred`](Self::flush_deferred) once the current event is dispatched.
    pub fn cancel_redirection(&mut self, contact: ContactId, deferred: bool) {
        let Some(register) = self.register_mut(contact) else {
            return;
        };
        if deferred {
            trace!(?contact, "redirect cancellation deferred");
            register.cancel_marked = true;
        } else {
            if register.redirect.target().is_some() {
                debug!(?contact, "redirect cancelled");
            }
            register.redirect = RedirectStatus::None;
            register.cancel_marked = false;
        }
    }

    /// Execute the deferred cancellations
    pub fn flush_deferred(&mut self) {
        for register in self.registers_mut().filter(|register| register.cancel_marked) {
            register.redirect = RedirectStatus::None;
            register.cancel_marked = false;
        }
    }

    /// Move the context of `contact` out of its register for a forwarded call
    pub(crate) fn lend_context(
        &mut self,
        contact: ContactId,
    ) -> Result<(ContainerHandle, RedirectContext), RedirectError> {
        let register = self
            .register_mut(contact)
            .ok_or(RedirectError::NotRedirecting(contact))?;
        match mem::replace(&mut register.redirect, RedirectStatus::None) {
            RedirectStatus::Active { target, context } => {
                register.redirect = RedirectStatus::Dispatching { target };
                Ok((target, context))
            }
            other => {
                register.redirect = other;
                Err(RedirectError::NotRedirecting(contact))
            }
        }
    }

    /// Give back a lent context, unless the redirect changed during the forwarded call
    pub(crate) fn restore_context(
        &mut self,
        contact: ContactId,
        target: ContainerHandle,
        context: RedirectContext,
    ) {
        let Some(register) = self.register_mut(contact) else {
            return;
        };
        match register.redirect {
            RedirectStatus::Dispatching { target: current } if current == target => {
                register.redirect = RedirectStatus::Active { target, context };
            }
            _ => trace!(?contact, "dropping replaced redirect context"),
        }
    }
}
