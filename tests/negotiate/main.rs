mod common;
mod extensions;
mod kx;
mod selection;
