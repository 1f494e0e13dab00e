pub mod path_sampler;
pub mod sanitizer;

pub use path_sampler::{sample_paths, sampling_query, DEFAULT_PATH_SAMPLE_CAP};
pub use sanitizer::{sanitize_rows, sanitize_value, DEFAULT_MAX_LIST_LEN};
