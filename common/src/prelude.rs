pub use crate::vfile::{VDirectory, VFile, VFileResolver, VFileSystem};
pub use crate::vpath::{VGlobalPath, VPath};
