pub(crate) mod filters;
pub(crate) mod overlay;
pub(crate) mod transform;
