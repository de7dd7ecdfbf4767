pub(crate) mod animator;
pub(crate) mod ease;
pub(crate) mod keyframes;
