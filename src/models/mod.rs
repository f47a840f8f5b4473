mod channel;
mod keyword;
mod video;

pub use channel::{Channel, ChannelMeta};
pub use keyword::{Keyword, KeywordSource};
pub use video::{NewVideo, Video, WatchStatus};
