pub(crate) mod blur;
pub(crate) mod composite;
pub(crate) mod config;
pub(crate) mod filters;
pub(crate) mod layer;
pub(crate) mod output;
pub(crate) mod registry;
pub(crate) mod runner;
pub(crate) mod step;
