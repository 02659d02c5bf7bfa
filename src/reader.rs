//! Readers for the input tables and for the GTF/GFF annotation source.

pub mod gxf;
pub mod table;
