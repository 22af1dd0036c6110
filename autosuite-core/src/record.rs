//! Invocation records
//!
//! An [`InvocationRecord`] is one captured call plus the user's verdict on
//! it. Records are never edited in place; the `with_*` methods return a new
//! record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::callable::{Arguments, CallResult, CallableRef, RaisedException};
use crate::value::Value;

/// The user's judgment of a captured call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Not yet decided; only seen while the prompt is open
    Unset,
    /// The result is what the call should return
    Equal,
    /// The result is what the call should not return
    NotEqual,
    /// The call is expected to raise the captured exception type
    RaisesException,
}

/// What a captured call produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Returned(Value),
    Raised(RaisedException),
}

impl Outcome {
    pub fn is_raised(&self) -> bool {
        matches!(self, Outcome::Raised(_))
    }

    /// Borrow the outcome back as a call result
    pub fn as_result(&self) -> Result<&Value, &RaisedException> {
        match self {
            Outcome::Returned(value) => Ok(value),
            Outcome::Raised(exception) => Err(exception),
        }
    }
}

impl From<CallResult> for Outcome {
    fn from(result: CallResult) -> Self {
        match result {
            Ok(value) => Outcome::Returned(value),
            Err(exception) => Outcome::Raised(exception),
        }
    }
}

/// A user's answer at the verdict prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Yes,
    No,
    Cancel,
}

impl Response {
    /// Interpret a line of input.
    ///
    /// Leading whitespace is ignored and only the first remaining character
    /// counts; anything other than `y`, `n` or `c` is rejected.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim_start().chars().next()? {
            'y' => Some(Response::Yes),
            'n' => Some(Response::No),
            'c' => Some(Response::Cancel),
            _ => None,
        }
    }
}

/// One captured invocation and its verdict
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRecord {
    verdict: Verdict,
    callable: CallableRef,
    arguments: Arguments,
    outcome: Outcome,
    sequence: u64,
    recorded_at: DateTime<Utc>,
}

impl InvocationRecord {
    /// A record whose verdict has not been collected yet.
    ///
    /// A raised outcome starts out as [`Verdict::RaisesException`] since no
    /// answer can change it to anything else.
    pub fn pending(callable: CallableRef, arguments: Arguments, outcome: Outcome) -> Self {
        let verdict = if outcome.is_raised() {
            Verdict::RaisesException
        } else {
            Verdict::Unset
        };
        Self {
            verdict,
            callable,
            arguments,
            outcome,
            sequence: 0,
            recorded_at: Utc::now(),
        }
    }

    /// A finalized record whose call should return `value`
    pub fn equal(callable: CallableRef, arguments: Arguments, value: Value) -> Self {
        Self {
            verdict: Verdict::Equal,
            ..Self::pending(callable, arguments, Outcome::Returned(value))
        }
    }

    /// A finalized record whose call should not return `value`
    pub fn not_equal(callable: CallableRef, arguments: Arguments, value: Value) -> Self {
        Self {
            verdict: Verdict::NotEqual,
            ..Self::pending(callable, arguments, Outcome::Returned(value))
        }
    }

    /// A finalized record that raised `exception`
    pub fn raised(callable: CallableRef, arguments: Arguments, exception: RaisedException) -> Self {
        Self::pending(callable, arguments, Outcome::Raised(exception))
    }

    /// Apply the user's response.
    ///
    /// Returns `None` when the response discards the candidate: a cancel, or
    /// a "no" for a raised exception, which has nothing to compare against.
    pub fn resolve(self, response: Response) -> Option<Self> {
        let verdict = match (response, &self.outcome) {
            (Response::Yes, Outcome::Returned(_)) => Verdict::Equal,
            (Response::Yes, Outcome::Raised(_)) => Verdict::RaisesException,
            (Response::No, Outcome::Returned(_)) => Verdict::NotEqual,
            (Response::No, Outcome::Raised(_)) | (Response::Cancel, _) => return None,
        };
        Some(Self { verdict, ..self })
    }

    /// Replace the callable reference, keeping everything else
    pub fn with_callable(self, callable: CallableRef) -> Self {
        Self { callable, ..self }
    }

    /// Stamp the position in the collection
    pub(crate) fn with_sequence(self, sequence: u64) -> Self {
        Self { sequence, ..self }
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn callable(&self) -> &CallableRef {
        &self.callable
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Position at which the record was appended
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// When the call was captured
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Whether the verdict is final and fits the outcome
    pub fn is_finalized(&self) -> bool {
        matches!(
            (self.verdict, &self.outcome),
            (Verdict::Equal | Verdict::NotEqual, Outcome::Returned(_))
                | (Verdict::RaisesException, Outcome::Raised(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy() -> CallableRef {
        CallableRef::new("test_main", "dummy")
    }

    #[test]
    fn test_response_parsing() {
        assert_eq!(Response::parse("y"), Some(Response::Yes));
        assert_eq!(Response::parse("   yes please"), Some(Response::Yes));
        assert_eq!(Response::parse("\tno"), Some(Response::No));
        assert_eq!(Response::parse("cancel"), Some(Response::Cancel));
        assert_eq!(Response::parse("Y"), None);
        assert_eq!(Response::parse(""), None);
        assert_eq!(Response::parse("   "), None);
        assert_eq!(Response::parse("maybe"), None);
    }

    #[test]
    fn test_yes_on_return_is_equal() {
        let record = InvocationRecord::pending(dummy(), Arguments::new(), Outcome::Returned(Value::Int(42)));
        assert!(!record.is_finalized());
        let record = record.resolve(Response::Yes).unwrap();
        assert_eq!(record.verdict(), Verdict::Equal);
        assert_eq!(record.outcome(), &Outcome::Returned(Value::Int(42)));
    }

    #[test]
    fn test_no_on_return_is_not_equal() {
        let record = InvocationRecord::pending(dummy(), Arguments::new(), Outcome::Returned(Value::None));
        assert_eq!(record.resolve(Response::No).unwrap().verdict(), Verdict::NotEqual);
    }

    #[test]
    fn test_raised_keeps_exception_verdict() {
        let exc = RaisedException::builtin("ValueError");
        let record = InvocationRecord::pending(dummy(), Arguments::new(), Outcome::Raised(exc.clone()));
        assert_eq!(record.verdict(), Verdict::RaisesException);

        let yes = record.clone().resolve(Response::Yes).unwrap();
        assert_eq!(yes.verdict(), Verdict::RaisesException);
        assert_eq!(yes.outcome(), &Outcome::Raised(exc));

        assert!(record.resolve(Response::No).is_none());
    }

    #[test]
    fn test_cancel_discards() {
        let record = InvocationRecord::pending(dummy(), Arguments::new(), Outcome::Returned(Value::None));
        assert!(record.resolve(Response::Cancel).is_none());
    }

    #[test]
    fn test_with_callable_preserves_data() {
        let args = Arguments::new().arg(3);
        let record = InvocationRecord::equal(dummy(), args.clone(), Value::Int(2));
        let replacement = CallableRef::new("test_main", "dummy");
        let rebound = record.clone().with_callable(replacement.clone());

        assert!(rebound.callable().same_definition(&replacement));
        assert_eq!(rebound.arguments(), &args);
        assert_eq!(rebound.outcome(), record.outcome());
        assert_eq!(rebound.verdict(), Verdict::Equal);
    }

    #[test]
    fn test_constructors_pair_verdict_with_outcome() {
        let equal = InvocationRecord::equal(dummy(), Arguments::new().arg(1), Value::Int(2));
        assert_eq!(equal.verdict(), Verdict::Equal);
        assert!(!equal.outcome().is_raised());

        let not_equal = InvocationRecord::not_equal(dummy(), Arguments::new(), Value::None);
        assert_eq!(not_equal.verdict(), Verdict::NotEqual);
        assert!(!not_equal.outcome().is_raised());

        let raised = InvocationRecord::raised(dummy(), Arguments::new(), RaisedException::builtin("ValueError"));
        assert_eq!(raised.verdict(), Verdict::RaisesException);
        assert!(raised.outcome().is_raised());
    }

    #[test]
    fn test_mismatched_verdict_is_never_finalized() {
        let record = InvocationRecord {
            verdict: Verdict::RaisesException,
            ..InvocationRecord::equal(dummy(), Arguments::new().arg(1), Value::Int(2))
        };
        assert!(!record.is_finalized());
        assert_eq!(
            crate::suite::record_to_assertion(&record),
            Err(crate::suite::SkipReason::Mismatched(Verdict::RaisesException))
        );

        let session = crate::session::Session::detached();
        assert!(session.append(record).is_err());
        assert!(session.is_empty());
    }
}
