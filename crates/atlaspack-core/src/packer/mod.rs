pub mod grid;
pub mod maxrects;
