use core::cell::RefCell;

use crate::error::TraceEntry;

/// The property trace of one top-level call.
///
/// Entries are pushed around every nested conversion and popped when the
/// returned [`TraceScope`] drops, on success and failure alike.
#[derive(Default)]
pub(crate) struct Trace {
    entries: RefCell<Vec<TraceEntry>>,
}

impl Trace {
    pub fn push(&self, name: &str, type_name: &str) -> TraceScope<'_> {
        let name = if name.is_empty() { "<unnamed>" } else { name };
        self.entries.borrow_mut().push(TraceEntry {
            name: name.to_owned(),
            type_name: type_name.to_owned(),
        });
        TraceScope { trace: self }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Log line prefix, one `>` per level.
    pub fn indent(&self) -> String {
        ">".repeat(self.depth())
    }

    pub fn snapshot(&self) -> Vec<TraceEntry> {
        self.entries.borrow().clone()
    }
}

pub(crate) struct TraceScope<'a> {
    trace: &'a Trace,
}

impl Drop for TraceScope<'_> {
    fn drop(&mut self) {
        if self.trace.entries.borrow_mut().pop().is_none() {
            log::warn!("corrupted property trace");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Trace;

    #[test]
    fn scopes_pop_in_order() {
        let trace = Trace::default();
        {
            let _outer = trace.push("outer", "Outer");
            {
                let _inner = trace.push("", "i32");
                assert_eq!(trace.depth(), 2);
                assert_eq!(trace.snapshot()[1].name, "<unnamed>");
                assert_eq!(trace.indent(), ">>");
            }
            assert_eq!(trace.depth(), 1);
        }
        assert_eq!(trace.depth(), 0);
    }

    #[test]
    fn scope_pops_on_early_return() {
        fn fails(trace: &Trace) -> Result<(), ()> {
            let _scope = trace.push("field", "T");
            Err(())
        }

        let trace = Trace::default();
        assert!(fails(&trace).is_err());
        assert_eq!(trace.depth(), 0);
    }
}
