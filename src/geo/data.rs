use super::{HubCategory, TransportHub};
use crate::types::Coordinates;

const fn airport(
    name: &'static str,
    code: &'static str,
    city: &'static str,
    lng: f64,
    lat: f64,
    aliases: &'static [&'static str],
) -> TransportHub {
    TransportHub {
        name,
        code: Some(code),
        city,
        category: HubCategory::Airport,
        coordinates: Coordinates(lng, lat),
        aliases,
    }
}

const fn station(
    name: &'static str,
    city: &'static str,
    lng: f64,
    lat: f64,
    aliases: &'static [&'static str],
) -> TransportHub {
    TransportHub {
        name,
        code: None,
        city,
        category: HubCategory::TrainStation,
        coordinates: Coordinates(lng, lat),
        aliases,
    }
}

/// Declaration order breaks ties between equally good matches.
pub static TRANSPORT_HUBS: &[TransportHub] = &[
    // Airports
    airport("北京首都国际机场", "PEK", "北京", 116.603, 40.080, &[
        "首都机场", "首都国际机场", "北京首都机场",
        "Beijing Capital International Airport", "Beijing Capital Airport",
    ]),
    airport("北京大兴国际机场", "PKX", "北京", 116.411, 39.509, &[
        "大兴机场", "大兴国际机场", "北京大兴机场",
        "Beijing Daxing International Airport", "Daxing Airport",
    ]),
    airport("上海浦东国际机场", "PVG", "上海", 121.805, 31.143, &[
        "浦东机场", "浦东国际机场", "上海浦东机场",
        "Shanghai Pudong Airport", "Shanghai Pudong International Airport", "Pudong Airport",
    ]),
    airport("上海虹桥国际机场", "SHA", "上海", 121.336, 31.198, &[
        "虹桥机场", "虹桥国际机场", "上海虹桥机场",
        "Shanghai Hongqiao International Airport", "Shanghai Hongqiao Airport", "Hongqiao Airport",
    ]),
    airport("广州白云国际机场", "CAN", "广州", 113.299, 23.392, &[
        "白云机场", "广州白云机场", "Guangzhou Baiyun International Airport", "Baiyun Airport",
    ]),
    airport("深圳宝安国际机场", "SZX", "深圳", 113.811, 22.639, &[
        "宝安机场", "深圳机场", "Shenzhen Bao'an International Airport", "Shenzhen Airport",
    ]),
    airport("成都天府国际机场", "TFU", "成都", 104.445, 30.319, &[
        "天府机场", "天府国际机场", "Chengdu Tianfu International Airport",
    ]),
    airport("成都双流国际机场", "CTU", "成都", 103.947, 30.578, &[
        "双流机场", "双流国际机场", "Chengdu Shuangliu International Airport",
    ]),
    airport("重庆江北国际机场", "CKG", "重庆", 106.642, 29.719, &[
        "江北机场", "重庆机场", "Chongqing Jiangbei International Airport",
    ]),
    airport("杭州萧山国际机场", "HGH", "杭州", 120.434, 30.229, &[
        "萧山机场", "杭州机场", "Hangzhou Xiaoshan International Airport",
    ]),
    airport("西安咸阳国际机场", "XIY", "西安", 108.752, 34.447, &[
        "咸阳机场", "西安机场", "Xi'an Xianyang International Airport",
    ]),
    airport("昆明长水国际机场", "KMG", "昆明", 102.929, 25.101, &[
        "长水机场", "昆明机场", "Kunming Changshui International Airport",
    ]),
    airport("香港国际机场", "HKG", "香港", 113.915, 22.308, &[
        "赤鱲角机场", "Hong Kong International Airport", "Chek Lap Kok",
    ]),
    airport("成田国际机场", "NRT", "东京", 140.386, 35.772, &[
        "成田机场", "东京成田机场", "Narita International Airport", "Narita Airport",
    ]),
    airport("东京羽田机场", "HND", "东京", 139.781, 35.549, &[
        "羽田机场", "羽田国际机场", "Tokyo Haneda Airport", "Haneda Airport",
    ]),
    airport("关西国际机场", "KIX", "大阪", 135.244, 34.434, &[
        "关西机场", "大阪关西机场", "Kansai International Airport", "Kansai Airport",
    ]),
    // Train stations
    station("北京南站", "北京", 116.379, 39.865, &["Beijing South Railway Station", "Beijing South Station"]),
    station("北京西站", "北京", 116.322, 39.895, &["Beijing West Railway Station", "Beijing West Station"]),
    station("北京站", "北京", 116.427, 39.903, &["北京火车站", "Beijing Railway Station"]),
    station("上海虹桥站", "上海", 121.320, 31.194, &[
        "虹桥站", "虹桥火车站", "上海虹桥火车站", "Shanghai Hongqiao Railway Station",
    ]),
    station("上海站", "上海", 121.455, 31.250, &["上海火车站", "Shanghai Railway Station"]),
    station("广州南站", "广州", 113.269, 22.989, &["Guangzhou South Railway Station"]),
    station("深圳北站", "深圳", 114.029, 22.609, &["Shenzhen North Railway Station"]),
    station("杭州东站", "杭州", 120.213, 30.291, &["Hangzhou East Railway Station"]),
    station("南京南站", "南京", 118.797, 31.968, &["Nanjing South Railway Station"]),
    station("成都东站", "成都", 104.141, 30.629, &["Chengdu East Railway Station"]),
    station("西安北站", "西安", 108.938, 34.377, &["Xi'an North Railway Station"]),
    station("武汉站", "武汉", 114.424, 30.607, &["武汉火车站", "Wuhan Railway Station"]),
    station("东京站", "东京", 139.767, 35.681, &["东京车站", "Tokyo Station"]),
    station("新大阪站", "大阪", 135.500, 34.733, &["Shin-Osaka Station"]),
];
