#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

//! # Handoff: icon ownership transfer for launcher shells
//!
//! This crate implements the core of a touch launcher: a grid of pages, a quick-launch bar and a
//! page tab bar, between which icons can be dragged. It does not draw anything and does not talk to
//! any windowing system; it consumes pointer events and tells its user, through a handler trait,
//! where things should go.
//!
//! ## Structure of the crate
//!
//! - [`input`] tracks the contacts currently touching the screen and recognizes gestures
//!   (taps, long presses, flicks) from them.
//! - [`transfer`] contains the icon ownership handshake between containers and the routing of a
//!   contact's events to a container other than the one it started on.
//! - [`shell`] glues everything together: the [`Launcher`](shell::Launcher) owns the containers and
//!   icons, classifies the zones under a dragged icon, pans between pages and settles icons when a
//!   drag ends.
//! - [`utils`] holds the geometry types, the generational arena and the easing curves.
//!
//! ## General principles
//!
//! ### State handling
//!
//! All state lives in a single [`Launcher`](shell::Launcher) value, and every operation takes
//! `&mut self`. Containers and icons are stored in arenas and referred to by
//! [`Handle`](utils::Handle)s, which become stale instead of dangling once their target is removed.
//! Whenever the launcher needs a decision from the outside (slot geometry, persisting a container,
//! launching an application), it calls into a [`LauncherHandler`](shell::LauncherHandler)
//! provided with each call.
//!
//! ### Logging
//!
//! The crate makes extensive use of [`tracing`] for its internal logging. Every launcher owns a
//! `launcher` span under which its operations are recorded.
//!
//! For release builds it is recommended to limit the log level during compile time, for example:
//!
//! ```toml
//! [dependencies]
//! tracing = { version = "0.1", features = ["max_level_trace", "release_max_level_debug"] }
//! ```

pub mod input;
pub mod shell;
pub mod transfer;
pub mod utils;
