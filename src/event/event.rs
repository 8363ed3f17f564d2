//! Event payload definitions for the emitter.
//!
//! Arguments are untyped. The emitter hands the same `EventArgs` to every
//! listener of a batch and never looks inside it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A single untyped event argument.
pub type Arg = Arc<dyn Any + Send + Sync>;

/// Immutable argument list passed to listeners.
///
/// Cloning is cheap: clones share the underlying values.
#[derive(Clone)]
pub struct EventArgs {
    values: Arc<[Arg]>,
}

impl EventArgs {
    /// Create an empty argument list
    pub fn new() -> Self {
        EventArgs {
            values: Arc::from(Vec::new()),
        }
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the argument at `index` as a `T`.
    ///
    /// Returns `None` when the index is out of range or the argument holds
    /// a different type. Casting is the listener's job; a mismatch is not
    /// an emitter error.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.downcast_ref::<T>()
    }

    /// Borrow the raw argument at `index`
    pub fn raw(&self, index: usize) -> Option<&Arg> {
        self.values.get(index)
    }

    /// Iterate over the raw arguments in emit order
    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.values.iter()
    }
}

impl Default for EventArgs {
    fn default() -> Self {
        EventArgs::new()
    }
}

impl From<Vec<Arg>> for EventArgs {
    fn from(values: Vec<Arg>) -> Self {
        EventArgs {
            values: Arc::from(values),
        }
    }
}

impl FromIterator<Arg> for EventArgs {
    fn from_iter<I: IntoIterator<Item = Arg>>(iter: I) -> Self {
        EventArgs::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl fmt::Debug for EventArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventArgs").field("len", &self.len()).finish()
    }
}

/// Build an [`EventArgs`] from a list of values.
///
/// ```
/// use night_emitter::args;
///
/// let args = args![42_i32, "hello", String::from("world")];
/// assert_eq!(args.len(), 3);
/// assert_eq!(args.get::<i32>(0), Some(&42));
/// assert_eq!(args.get::<&str>(1), Some(&"hello"));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::event::EventArgs::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::event::EventArgs::from(::std::vec![
            $(::std::sync::Arc::new($value) as $crate::event::Arg),+
        ])
    };
}
