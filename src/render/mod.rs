pub(crate) mod pipeline;
pub(crate) mod raster;
pub(crate) mod scheduler;
pub(crate) mod surface;
