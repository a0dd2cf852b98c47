/// Well-known landmark recognised without a type suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landmark {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

impl Landmark {
    /// Canonical name followed by its aliases.
    pub fn spellings(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

/// The landmark one of whose spellings equals `name`, ignoring ASCII case.
pub fn lookup_landmark(name: &str) -> Option<&'static Landmark> {
    let name = name.trim();
    LANDMARKS
        .iter()
        .find(|landmark| landmark.spellings().any(|spelling| spelling.eq_ignore_ascii_case(name)))
}

const fn landmark(name: &'static str, aliases: &'static [&'static str]) -> Landmark {
    Landmark { name, aliases }
}

/// Declaration order is the scan order.
pub static LANDMARKS: &[Landmark] = &[
    // China
    landmark("故宫", &["紫禁城", "Forbidden City"]),
    landmark("天安门", &["Tiananmen"]),
    landmark("长城", &["八达岭", "慕田峪", "Great Wall"]),
    landmark("颐和园", &["Summer Palace"]),
    landmark("天坛", &["Temple of Heaven"]),
    landmark("圆明园", &[]),
    landmark("南锣鼓巷", &[]),
    landmark("外滩", &["The Bund"]),
    landmark("东方明珠", &["Oriental Pearl"]),
    landmark("豫园", &["Yu Garden"]),
    landmark("上海迪士尼", &["迪士尼乐园", "Shanghai Disneyland"]),
    landmark("西湖", &["West Lake"]),
    landmark("灵隐寺", &[]),
    landmark("雷峰塔", &["Leifeng Pagoda"]),
    landmark("黄鹤楼", &["Yellow Crane Tower"]),
    landmark("兵马俑", &["Terracotta Army", "Terracotta Warriors"]),
    landmark("大雁塔", &[]),
    landmark("布达拉宫", &["Potala Palace"]),
    landmark("宽窄巷子", &[]),
    landmark("大熊猫基地", &["熊猫基地", "Panda Base"]),
    landmark("洪崖洞", &[]),
    landmark("鼓浪屿", &["Gulangyu"]),
    landmark("黄山", &["Huangshan", "Yellow Mountain"]),
    landmark("张家界", &["Zhangjiajie"]),
    landmark("九寨沟", &["Jiuzhaigou"]),
    landmark("乐山大佛", &["Leshan Giant Buddha"]),
    landmark("维多利亚港", &["Victoria Harbour"]),
    // Japan
    landmark("东京塔", &["Tokyo Tower"]),
    landmark("浅草寺", &["Senso-ji", "Sensoji"]),
    landmark("晴空塔", &["东京晴空塔", "Skytree"]),
    landmark("明治神宫", &["Meiji Shrine", "Meiji Jingu"]),
    landmark("富士山", &["Mount Fuji", "Mt. Fuji"]),
    landmark("清水寺", &["Kiyomizu-dera"]),
    landmark("金阁寺", &["Kinkaku-ji"]),
    landmark("伏见稻荷大社", &["伏见稻荷", "Fushimi Inari"]),
    landmark("大阪城", &["Osaka Castle"]),
    landmark("环球影城", &["Universal Studios"]),
    landmark("奈良公园", &["Nara Park"]),
    // Elsewhere
    landmark("埃菲尔铁塔", &["艾菲尔铁塔", "Eiffel Tower"]),
    landmark("卢浮宫", &["Louvre"]),
    landmark("凯旋门", &["Arc de Triomphe"]),
    landmark("大本钟", &["Big Ben"]),
    landmark("自由女神像", &["Statue of Liberty"]),
    landmark("时代广场", &["Times Square"]),
    landmark("罗马斗兽场", &["斗兽场", "Colosseum"]),
    landmark("圣家堂", &["Sagrada Familia"]),
    landmark("悉尼歌剧院", &["Sydney Opera House"]),
    landmark("泰姬陵", &["Taj Mahal"]),
    landmark("吴哥窟", &["Angkor Wat"]),
    landmark("景福宫", &["Gyeongbokgung"]),
];

/// Landmark type suffixes, longest first so compound suffixes win.
pub(crate) const CJK_SUFFIXES: &[&str] = &[
    "风景区", "博物馆", "博物院", "美术馆", "纪念馆", "科技馆", "水族馆", "动物园", "植物园",
    "景区", "公园", "广场", "遗址", "故居", "大桥", "神社", "古镇", "寺", "塔", "山", "湖",
    "宫", "殿", "堂", "馆", "园", "岛", "桥", "庙", "峰", "楼", "阁",
];

pub(crate) const LATIN_SUFFIXES: &[&str] = &[
    "Temple", "Tower", "Mountain", "Mount", "Lake", "Palace", "Hall", "Museum", "Park",
    "Island", "Bridge", "Square", "Plaza", "Ruins", "Shrine", "Castle", "Cathedral", "Gardens",
    "Garden",
];
