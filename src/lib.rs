// Watermark worker library
//
// Queue-driven image watermarking: storage notifications arrive on a queue,
// each referenced image is fetched, stamped with its own file name and
// written to the output bucket.

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod logging;
pub mod pipeline;
pub mod queue;
pub mod shutdown;
pub mod storage;
pub mod watermark;
pub mod work;
