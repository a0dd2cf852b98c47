use std::fmt::Write as _;

use crate::{extract::RequiredEntitySet, types::PlanRequest};

const TRANSPORT_KEYWORDS: &[&str] = &[
    "机票", "航班", "飞机", "高铁", "火车", "动车", "车票", "大巴", "交通", "怎么去", "如何去",
    "出发", "往返", "flight", "train", "airport", "station", "how to get",
];

/// Keyword heuristic: does the traveller want inter-city transport planned too?
pub fn is_transport_request(text: &str) -> bool {
    let lowered = text.to_lowercase();
    TRANSPORT_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Base system instruction. Schema requirements are appended separately.
pub fn build_system_prompt() -> String {
    [
        "你是一名专业的旅行规划师。根据用户的需求制定详细、可执行的逐日行程。",
        "只输出一个 JSON 对象，不要输出 Markdown 代码块或任何额外说明文字。",
        "所有费用字段（cost、ticket_price、price_per_night、price_per_person、price、total_cost）必须是数字；免费请写 0，不要写 \"free\" 或 \"免费\"。",
        "每个非交通类活动都要给出 coordinates，格式为 [经度, 纬度]。",
        "活动的 type 只能是 attraction、restaurant、shopping、transport、entertainment、other 之一。",
        "字符串中的换行请使用 \\n 转义。",
    ]
    .join("\n")
}

/// User message for one planning request.
pub fn build_user_prompt(request: &PlanRequest, required: &RequiredEntitySet) -> String {
    let mut prompt = format!("目的地：{}\n", request.destination);

    if let Some(days) = request.days {
        let _ = writeln!(prompt, "天数：{days}天");
    }
    if let Some(start_date) = &request.start_date {
        let _ = writeln!(prompt, "出发日期：{start_date}");
    }
    if let Some(budget) = request.budget {
        let _ = writeln!(prompt, "总预算：{budget}元");
    }
    if let Some(travelers) = request.travelers {
        let _ = writeln!(prompt, "出行人数：{travelers}人");
    }
    if let Some(city) = &request.departure_city {
        let _ = writeln!(prompt, "出发城市：{city}");
    }
    if !request.preferences.is_empty() {
        let _ = writeln!(prompt, "偏好：{}", request.preferences.join("、"));
    }
    if !required.is_empty() {
        let names: Vec<&str> = required.iter().collect();
        let _ = writeln!(
            prompt,
            "必须安排的景点（活动名称中请保留原名）：{}",
            names.join("、")
        );
    }
    if is_transport_request(&request.user_text) {
        prompt.push_str(
            "请在对应日期的 transport 数组中规划城市间交通（航班或火车），包含出发地、到达地、时间和票价。\n",
        );
    }
    if !request.user_text.trim().is_empty() {
        let _ = writeln!(prompt, "\n用户原话：{}", request.user_text.trim());
    }

    prompt
}
