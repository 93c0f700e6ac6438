//! Thread classes: the kind of work a task is pinned to, and the mask of
//! classes a given worker thread is willing to service.

use bitflags::bitflags;

/// The category of work a [`crate::task::Task`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadClass {
    /// Must run on the thread that owns the event loop.
    Main,
    /// General-purpose background work.
    Worker,
    /// Work that touches renderer-owned resources.
    Renderer,
    /// Disk reads/writes.
    FileIo,
    /// Network requests.
    Network,
}

impl ThreadClass {
    /// Every class, in queue-index order.
    pub const ALL: [ThreadClass; 5] =
        [ThreadClass::Main, ThreadClass::Worker, ThreadClass::Renderer, ThreadClass::FileIo, ThreadClass::Network];

    /// Index of this class into a 5-element, class-indexed array.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            ThreadClass::Main => 0,
            ThreadClass::Worker => 1,
            ThreadClass::Renderer => 2,
            ThreadClass::FileIo => 3,
            ThreadClass::Network => 4,
        }
    }

    /// The single-bit mask representing this class.
    #[must_use]
    pub fn mask(self) -> ThreadClassMask {
        match self {
            ThreadClass::Main => ThreadClassMask::MAIN,
            ThreadClass::Worker => ThreadClassMask::WORKER,
            ThreadClass::Renderer => ThreadClassMask::RENDERER,
            ThreadClass::FileIo => ThreadClassMask::FILE_IO,
            ThreadClass::Network => ThreadClassMask::NETWORK,
        }
    }
}

bitflags! {
    /// The set of [`ThreadClass`] a worker thread will pull tasks from.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ThreadClassMask: u8 {
        /// See [`ThreadClass::Main`].
        const MAIN = 0b0000_0001;
        /// See [`ThreadClass::Worker`].
        const WORKER = 0b0000_0010;
        /// See [`ThreadClass::Renderer`].
        const RENDERER = 0b0000_0100;
        /// See [`ThreadClass::FileIo`].
        const FILE_IO = 0b0000_1000;
        /// See [`ThreadClass::Network`].
        const NETWORK = 0b0001_0000;
    }
}

impl ThreadClassMask {
    /// All five classes.
    #[must_use]
    pub fn all_classes() -> Self {
        Self::all()
    }
}
