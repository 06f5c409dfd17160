//! Call stack capture for native code.
//!
//! Two walkers produce raw return addresses, innermost first:
//!
//! - [`walk::fp`] chases saved frame pointers. Cheap, needs frame pointers.
//! - [`walk::eh`] asks the platform unwinder to follow the unwind tables.
//!   Slow, works on any code with `.eh_frame`.
//!
//! [`Capture`] and [`StackTrace`] pick one, hide their own frames and
//! remember the result. No walk ever fails: a broken frame chain, unknown
//! stack limits or a full buffer all just end the trace early, which keeps
//! this usable from crash handlers.
//!
//! ```no_run
//! let mut frames = [0usize; 64];
//! let mut capture = fastwind::Capture::new(&mut frames);
//! for pc in capture.unwind().iter() {
//!     println!("{pc:#x}");
//! }
//! ```

#[macro_use]
extern crate tracing;

pub mod arch;
mod capture;
pub mod frame;
mod limits;
mod trace;
pub mod uw;
pub mod walk;

pub use capture::{Capture, StackTrace, Strategy, MAX_FRAMES};
pub use limits::StackLimits;
pub use trace::{Tag, Trace};
pub use walk::Termination;
