//! IRIs of the vocabularies used by the history document.

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_LIST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#List";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

/// Profiles vocabulary (W3C DXWG).
pub const PROF_NS: &str = "http://www.w3.org/ns/dx/prof/";
pub const PROF_RESOURCE_DESCRIPTOR: &str = "http://www.w3.org/ns/dx/prof/ResourceDescriptor";
pub const PROF_HAS_RESOURCE: &str = "http://www.w3.org/ns/dx/prof/hasResource";
pub const PROF_HAS_ROLE: &str = "http://www.w3.org/ns/dx/prof/hasRole";

pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

pub const LDP_BASIC_CONTAINER: &str = "http://www.w3.org/ns/ldp#BasicContainer";
pub const LDP_RESOURCE: &str = "http://www.w3.org/ns/ldp#Resource";

/// Prefixes written into serialized documents and patches.
pub const WELL_KNOWN_PREFIXES: &[(&str, &str)] = &[
    ("rdf", RDF_NS),
    ("prof", PROF_NS),
    ("xsd", XSD_NS),
];

/// Media type of the document format.
pub const TURTLE_MEDIA_TYPE: &str = "text/turtle";
/// Media type of the update language.
pub const SPARQL_UPDATE_MEDIA_TYPE: &str = "application/sparql-update";
