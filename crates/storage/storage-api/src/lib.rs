//! A thin facade pairing a `FileManager` and a `BufferManager<F>`, exposing
//! `read_page`/`write_page`/`new_page` returning RAII page guards. This is
//! the supporting type the B-tree's pin-source adapter is built over.

#![allow(missing_docs)]

pub mod storage_manager;
