pub mod cpu_gaussian_compositor;
mod gaussian;
pub mod outline;
