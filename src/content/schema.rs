//! Declared shape of every page kind.
//!
//! The registry drives three things: which collection a kind lives in, how its
//! documents are addressed, and (under [`FieldPolicy::Strict`]) which section
//! and field names a write may touch.

use crate::core::{CmsError, Result};
use std::fmt;
use std::str::FromStr;

/// Whether writes are checked against the declared section fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldPolicy {
    /// Unknown sections and keys are rejected.
    #[default]
    Strict,
    /// Any key is written under `sectionName.key`.
    Open,
}

impl FromStr for FieldPolicy {
    type Err = CmsError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "open" | "permissive" => Ok(Self::Open),
            other => Err(CmsError::validation(format!(
                "Unknown field policy '{other}' (expected strict or open)"
            ))),
        }
    }
}

/// How documents of a kind are picked for reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// Exactly one document, stored under the well-known singleton id.
    Singleton,
    /// A small family addressed by insertion order.
    Indexed,
    /// Any number of documents addressed by `_id`.
    ById,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionShape {
    /// An object of named fields (some of which may be embedded lists).
    Group,
    /// An embedded list stored directly at the section name.
    List,
}

#[derive(Debug)]
pub struct SectionSpec {
    pub name: &'static str,
    pub shape: SectionShape,
    /// Field names of a group section; empty for list sections.
    pub fields: &'static [&'static str],
}

/// An embedded list of sub-documents, each carrying its own `_id`.
#[derive(Debug)]
pub struct ListSpec {
    /// Dotted path of the array inside the page document.
    pub path: &'static str,
    /// Request-body key that carries the entry, e.g. `point`.
    pub item_key: &'static str,
    pub fields: &'static [&'static str],
    /// Boolean flag flipped by the `status` action; defaults to `false` on add.
    pub status_flag: Option<&'static str>,
    pub editable: bool,
}

impl ListSpec {
    pub fn allows_field(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Home,
    About,
    Products,
    Mica,
    Quartz,
    NewProduct,
    Csr,
    ContactUs,
    Location,
}

impl PageKind {
    pub const ALL: [PageKind; 9] = [
        PageKind::Home,
        PageKind::About,
        PageKind::Products,
        PageKind::Mica,
        PageKind::Quartz,
        PageKind::NewProduct,
        PageKind::Csr,
        PageKind::ContactUs,
        PageKind::Location,
    ];

    pub fn schema(self) -> &'static PageSchema {
        match self {
            PageKind::Home => &HOME,
            PageKind::About => &ABOUT,
            PageKind::Products => &PRODUCTS,
            PageKind::Mica => &MICA,
            PageKind::Quartz => &QUARTZ,
            PageKind::NewProduct => &NEW_PRODUCT,
            PageKind::Csr => &CSR,
            PageKind::ContactUs => &CONTACT_US,
            PageKind::Location => &LOCATION,
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema().label)
    }
}

#[derive(Debug)]
pub struct PageSchema {
    pub kind: PageKind,
    pub collection: &'static str,
    /// Human name used in messages, e.g. `HomePage`.
    pub label: &'static str,
    /// Key wrapping the document in create/delete responses.
    pub response_key: &'static str,
    pub addressing: Addressing,
    /// Maintain `createdAt` / `updatedAt` on every write.
    pub timestamps: bool,
    /// Scalar fields stored at the document root.
    pub root_fields: &'static [&'static str],
    pub sections: &'static [SectionSpec],
    pub lists: &'static [ListSpec],
}

impl PageSchema {
    pub fn section(&self, name: &str) -> Option<&'static SectionSpec> {
        self.sections.iter().find(|section| section.name == name)
    }

    pub fn list(&self, path: &str) -> Option<&'static ListSpec> {
        self.lists.iter().find(|list| list.path == path)
    }

    pub fn has_root_field(&self, name: &str) -> bool {
        self.root_fields.contains(&name)
    }

    /// Message used whenever the addressed document does not exist.
    pub fn missing_message(&self, selector: &crate::storage::Selector) -> String {
        use crate::storage::Selector;
        match selector {
            Selector::Singleton => format!("{} document not found", self.label),
            Selector::Index(index) => format!("{} not found for index {index}", self.label),
            Selector::Id(id) => format!("{} '{id}' not found", self.label),
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

const TITLED_LINK: &[&str] = &["title", "discription", "linkText", "backGroundImageUrl"];
const BANNER: &[&str] = &["title", "description", "backgroundImage"];
const BANNER_URL: &[&str] = &["title", "description", "backgroundImageUrl"];
const IMAGE_BLOCK: &[&str] = &["image", "title", "description"];
const TEXT_IMAGE_URL: &[&str] = &["title", "description", "imageUrl"];
const POINTS_SECTION: &[&str] = &["title", "points"];
const SUB_PRODUCTS_SECTION: &[&str] = &["title", "subProducts"];
const VIDEO_SECTION: &[&str] = &["videoThumbnail", "videoUrl"];

const fn group(name: &'static str, fields: &'static [&'static str]) -> SectionSpec {
    SectionSpec {
        name,
        shape: SectionShape::Group,
        fields,
    }
}

const fn list_section(name: &'static str) -> SectionSpec {
    SectionSpec {
        name,
        shape: SectionShape::List,
        fields: &[],
    }
}

const fn points(path: &'static str) -> ListSpec {
    ListSpec {
        path,
        item_key: "point",
        fields: &["point"],
        status_flag: None,
        editable: true,
    }
}

const fn sub_products(path: &'static str) -> ListSpec {
    ListSpec {
        path,
        item_key: "subProduct",
        fields: &["title", "image"],
        status_flag: None,
        editable: true,
    }
}

/// Sections shared by the quartz family and new-product pages.
const PRODUCT_DETAIL_SECTIONS: &[SectionSpec] = &[
    group("bannerSection", BANNER_URL),
    group("sectionOne", TEXT_IMAGE_URL),
    group("sectionTwo", POINTS_SECTION),
    group("sectionThree", VIDEO_SECTION),
];

const PRODUCT_DETAIL_LISTS: &[ListSpec] = &[points("sectionTwo.points")];

pub static HOME: PageSchema = PageSchema {
    kind: PageKind::Home,
    collection: "homepage",
    label: "HomePage",
    response_key: "homepage",
    addressing: Addressing::Singleton,
    timestamps: false,
    root_fields: &[],
    sections: &[
        group("bannerSection", &["title", "subTitle", "banner"]),
        group("sectionOne", &["title", "discription"]),
        group("sectionTwo", TITLED_LINK),
        group("sectionThree", TITLED_LINK),
        group("sectionFour", TITLED_LINK),
        group("sectionFive", TITLED_LINK),
    ],
    lists: &[],
};

pub static ABOUT: PageSchema = PageSchema {
    kind: PageKind::About,
    collection: "aboutpage",
    label: "AboutPage",
    response_key: "aboutPage",
    addressing: Addressing::Singleton,
    timestamps: true,
    root_fields: &[],
    sections: &[
        group("heroSection", BANNER),
        group("legacySection", &["heading", "description"]),
        group(
            "aboutFounderSection",
            &["image", "title", "subTitle", "highlights"],
        ),
        group("journeySection", IMAGE_BLOCK),
        group("reformEraSection", IMAGE_BLOCK),
        group(
            "modernEraSection",
            &["title", "description", "stats", "lastLine"],
        ),
        group("missionSection", IMAGE_BLOCK),
    ],
    // No list route reaches these. They are replaced whole through section
    // patches, which check entry fields and assign ids from them.
    lists: &[
        ListSpec {
            path: "aboutFounderSection.highlights",
            item_key: "highlight",
            fields: &["heading", "description"],
            status_flag: None,
            editable: true,
        },
        ListSpec {
            path: "modernEraSection.stats",
            item_key: "stat",
            fields: &["value", "label"],
            status_flag: None,
            editable: true,
        },
    ],
};

pub static PRODUCTS: PageSchema = PageSchema {
    kind: PageKind::Products,
    collection: "productspage",
    label: "ProductsPage",
    response_key: "productsPage",
    addressing: Addressing::Singleton,
    timestamps: false,
    root_fields: &[],
    sections: &[
        group("bannerSection", &["title", "subTitle", "backgroundImage"]),
        list_section("productsSection"),
    ],
    lists: &[ListSpec {
        path: "productsSection",
        item_key: "product",
        fields: &["image", "title", "description", "toUrl"],
        status_flag: None,
        editable: true,
    }],
};

pub static MICA: PageSchema = PageSchema {
    kind: PageKind::Mica,
    collection: "micapage",
    label: "MicaPage",
    response_key: "micaPage",
    addressing: Addressing::Singleton,
    timestamps: false,
    root_fields: &[],
    sections: &[
        group("bannerSection", BANNER_URL),
        group("sectionOne", TEXT_IMAGE_URL),
        group("sectionTwo", POINTS_SECTION),
        group("sectionThree", SUB_PRODUCTS_SECTION),
        group("sectionFour", TEXT_IMAGE_URL),
    ],
    lists: &[
        points("sectionTwo.points"),
        sub_products("sectionThree.subProducts"),
    ],
};

pub static QUARTZ: PageSchema = PageSchema {
    kind: PageKind::Quartz,
    collection: "quartzpage",
    label: "QuartzPage",
    response_key: "quartzPage",
    addressing: Addressing::Indexed,
    timestamps: false,
    root_fields: &[],
    sections: PRODUCT_DETAIL_SECTIONS,
    lists: PRODUCT_DETAIL_LISTS,
};

pub static NEW_PRODUCT: PageSchema = PageSchema {
    kind: PageKind::NewProduct,
    collection: "newproductpage",
    label: "NewProductPage",
    response_key: "newProductPage",
    addressing: Addressing::ById,
    timestamps: false,
    root_fields: &["isNewProductPage"],
    sections: PRODUCT_DETAIL_SECTIONS,
    lists: PRODUCT_DETAIL_LISTS,
};

pub static CSR: PageSchema = PageSchema {
    kind: PageKind::Csr,
    collection: "csrpage",
    label: "CsrPage",
    response_key: "csrPage",
    addressing: Addressing::Singleton,
    timestamps: false,
    root_fields: &[],
    sections: &[
        group("bannerSection", BANNER),
        group("sectionOne", &["title", "description"]),
        group("sectionTwo", SUB_PRODUCTS_SECTION),
    ],
    lists: &[sub_products("sectionTwo.subProducts")],
};

pub static CONTACT_US: PageSchema = PageSchema {
    kind: PageKind::ContactUs,
    collection: "contactuspage",
    label: "ContactusPage",
    response_key: "contactusPage",
    addressing: Addressing::Singleton,
    timestamps: false,
    root_fields: &[],
    sections: &[
        group("bannerSection", BANNER),
        group(
            "contactDetails",
            &[
                "address",
                "phone",
                "email",
                "mapEmbedLink",
                "workingHours",
                "mapImage",
            ],
        ),
        list_section("enquiryForm"),
    ],
    lists: &[ListSpec {
        path: "enquiryForm",
        item_key: "enquiry",
        fields: &["isResolved", "name", "email", "phone", "subject", "message"],
        status_flag: Some("isResolved"),
        editable: false,
    }],
};

pub static LOCATION: PageSchema = PageSchema {
    kind: PageKind::Location,
    collection: "locationpage",
    label: "Location",
    response_key: "data",
    addressing: Addressing::ById,
    timestamps: false,
    root_fields: &["title", "address", "imageUrl"],
    sections: &[],
    lists: &[],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::validate_collection_name;
    use std::collections::HashSet;

    #[test]
    fn every_kind_points_back_at_itself() {
        for kind in PageKind::ALL {
            assert_eq!(kind.schema().kind, kind);
        }
    }

    #[test]
    fn collection_names_are_unique_and_valid() {
        let mut seen = HashSet::new();
        for kind in PageKind::ALL {
            let collection = kind.schema().collection;
            assert!(validate_collection_name(collection).is_ok(), "{collection}");
            assert!(seen.insert(collection), "duplicate collection {collection}");
        }
    }

    #[test]
    fn every_list_hangs_off_a_declared_field() {
        for kind in PageKind::ALL {
            let schema = kind.schema();
            for list in schema.lists {
                match list.path.split_once('.') {
                    Some((section, field)) => {
                        let spec = schema.section(section).expect("section declared");
                        assert_eq!(spec.shape, SectionShape::Group);
                        assert!(spec.fields.contains(&field), "{}", list.path);
                    }
                    None => {
                        let spec = schema.section(list.path).expect("section declared");
                        assert_eq!(spec.shape, SectionShape::List);
                    }
                }
            }
        }
    }

    #[test]
    fn status_flag_is_a_declared_field() {
        for kind in PageKind::ALL {
            for list in kind.schema().lists {
                if let Some(flag) = list.status_flag {
                    assert!(list.allows_field(flag));
                }
            }
        }
    }

    #[test]
    fn field_policy_parses() {
        assert_eq!("strict".parse::<FieldPolicy>().unwrap(), FieldPolicy::Strict);
        assert_eq!(" OPEN ".parse::<FieldPolicy>().unwrap(), FieldPolicy::Open);
        assert!("loose".parse::<FieldPolicy>().is_err());
    }
}
