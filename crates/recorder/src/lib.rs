//! Call recorder and strict verifier for hand-written test doubles.
//!
//! A double implements the collaborator's trait by forwarding every method to a [`Surface`]
//! obtained from a shared [`CallRecorder`]. Tests register expectations on the surface, run
//! the subject, then call [`CallRecorder::verify_all`] and
//! [`CallRecorder::verify_no_other_calls`].

mod call_recorder;
mod expectation;
mod matcher;
mod outcome;
mod recorded_call;
mod surface;

pub use call_recorder::CallRecorder;
pub use expectation::{ExpectationId, ExpectationSummary};
pub use matcher::{ArgumentMatcher, Matcher, decode_argument, encode_arguments};
pub use outcome::Outcome;
pub use recorded_call::RecordedCall;
pub use surface::{ExpectationBuilder, Surface};

pub use call_harness_common::{HarnessError, MockFailure, Times, VerificationMode};
