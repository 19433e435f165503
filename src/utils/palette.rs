use serde::{Deserialize, Serialize};

/// Display color in BGR order
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8);

/// Named colors cycled over identities
///
pub const COLORS_TABLE: [(&str, Color); 19] = [
    ("Nebulas Blue", Color(170, 105, 63)),
    ("Valiant Poppy", Color(58, 61, 189)),
    ("Ultra Violet", Color(149, 91, 107)),
    ("Red Pear", Color(69, 65, 127)),
    ("Ceylon Yellow", Color(65, 174, 213)),
    ("Martini Olive", Color(87, 111, 118)),
    ("Russet Orange", Color(46, 122, 228)),
    ("Crocus Petal", Color(201, 158, 190)),
    ("Limelight", Color(127, 234, 241)),
    ("Quetzal Green", Color(109, 110, 0)),
    ("Niagara", Color(169, 140, 87)),
    ("Primrose Yellow", Color(85, 209, 246)),
    ("Lapis Blue", Color(141, 75, 0)),
    ("Flame", Color(44, 85, 242)),
    ("Island Paradise", Color(227, 222, 149)),
    ("Pale Dogwood", Color(194, 205, 237)),
    ("Pink Yarrow", Color(117, 49, 206)),
    ("Kale", Color(71, 114, 90)),
    ("Hazelnut", Color(149, 176, 207)),
];

/// Color of the identity, indexed by the identity modulo the table size
///
pub fn color_for(identity: u64) -> Color {
    COLORS_TABLE[(identity % COLORS_TABLE.len() as u64) as usize].1
}
