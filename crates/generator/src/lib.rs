// Sitemap generation: route mapping, assembly, XML output

pub mod assembler;
pub mod robots;
pub mod routes;
pub mod xml;

pub use assembler::{Assembly, AssemblerOptions, CategoryReport, GenerationReport, SitemapAssembler, SitemapOutput};
pub use robots::render_robots;
pub use routes::RouteBuilder;
pub use xml::{XmlWriter, escape_xml, render_sitemap_index, render_urlset};
