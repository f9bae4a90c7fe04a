mod detail;
mod grid;

pub use detail::DetailView;
pub use grid::GridView;
