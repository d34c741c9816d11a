#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod aliases;
pub mod config;
pub mod context;
pub mod error;
pub mod externals;
pub mod paths;
pub mod pipeline;
pub mod platform;
pub mod resolution;
pub mod resolver;
pub mod rewrite;
pub mod shims;
pub mod tsconfig;
pub mod version;
pub mod virtual_modules;

pub use config::Config;
pub use context::{ContextMutator, ResolutionContext};
pub use error::{ConfigError, ResolveError};
pub use pipeline::{
    MemoryResolutionCache, PipelineBuilder, ResolutionCache, ResolverPipeline, ResolverStrategy,
    StrategyContext,
};
pub use platform::{Environment, Platform};
pub use resolution::Resolution;
pub use resolver::{FsResolver, ModuleResolver};
pub use tsconfig::{PathMappingConfig, PathMappingStore};
pub use version::VERSION;
pub use virtual_modules::{VirtualId, VirtualModuleRegistry};
