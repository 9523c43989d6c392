pub mod feed;
pub mod library;
pub mod queue;
pub mod recorder;
pub mod samples;
pub mod seen;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use feed::TopicFeed;
pub use library::{Library, LibraryService, Profile};
pub use queue::PrefetchQueue;
pub use recorder::InteractionRecorder;
pub use samples::sample_books;
pub use seen::SeenSet;
pub use session::DiscoverySession;
