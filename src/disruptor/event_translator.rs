//! Event translators
//!
//! A translator writes payload data into an already-claimed slot, which
//! keeps the claim/write/publish dance behind a single call on the
//! sequencer ([`crate::disruptor::Sequencer::publish_event`]).

/// Populate a claimed event slot in place.
pub trait EventTranslator<T>: Send + Sync {
    /// Write into `event`, the slot claimed at `sequence`.
    fn translate_to(&self, event: &mut T, sequence: i64);
}

/// Every `Fn(&mut T, i64)` closure is a translator.
impl<T, F> EventTranslator<T> for F
where
    F: Fn(&mut T, i64) + Send + Sync,
{
    fn translate_to(&self, event: &mut T, sequence: i64) {
        self(event, sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_translator() {
        let translator = |event: &mut i64, sequence: i64| *event = sequence * 2;

        let mut event = 0i64;
        translator.translate_to(&mut event, 21);
        assert_eq!(event, 42);
    }
}
