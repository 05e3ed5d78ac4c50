//! Built-in multilingual property terms (English, Chinese, Swedish).

use super::{Property, PropertyTermSet, GENERAL};

/// Priority buckets with the priority value each bucket maps to
pub(crate) const PRIORITY_BUCKETS: &[(&str, u8)] =
    &[("high", 1), ("medium", 2), ("low", 3), ("lowest", 4)];

/// Due-date buckets with the date token each bucket resolves to
pub(crate) const DUE_DATE_BUCKETS: &[(&str, &str)] = &[
    ("today", "today"),
    ("tomorrow", "tomorrow"),
    ("overdue", "overdue"),
    ("thisWeek", "week"),
    ("nextWeek", "next-week"),
    ("future", "future"),
];

const PRIORITY: &[(&str, &[&str])] = &[
    (
        GENERAL,
        &["priority", "prio", "important", "urgent", "优先级", "优先", "重要", "紧急", "prioritet", "viktig", "brådskande"],
    ),
    (
        "high",
        &["high", "highest", "critical", "top", "高", "最高", "高优先级", "hög", "högsta", "kritisk"],
    ),
    ("medium", &["medium", "normal", "moderate", "中", "中等", "普通", "medel", "mellan"]),
    ("low", &["low", "minor", "低", "低优先级", "次要", "låg"]),
    ("lowest", &["lowest", "trivial", "最低", "lägsta"]),
];

const DUE_DATE: &[(&str, &[&str])] = &[
    (
        GENERAL,
        &["due", "deadline", "due date", "scheduled", "截止", "到期", "期限", "截止日期", "förfaller", "förfallodatum"],
    ),
    ("today", &["today", "今天", "今日", "idag", "i dag"]),
    ("tomorrow", &["tomorrow", "明天", "明日", "imorgon", "i morgon"]),
    ("overdue", &["overdue", "late", "past due", "过期", "逾期", "已过期", "försenad", "förfallen"]),
    ("thisWeek", &["this week", "本周", "这周", "denna vecka", "den här veckan"]),
    ("nextWeek", &["next week", "下周", "下星期", "nästa vecka"]),
    ("future", &["future", "upcoming", "later", "将来", "未来", "即将", "framtida", "kommande"]),
];

const STATUS: &[(&str, &[&str])] = &[
    (GENERAL, &["status", "state", "状态", "状况", "tillstånd"]),
    ("open", &["open", "todo", "pending", "未完成", "待办", "öppen", "att göra"]),
    ("inProgress", &["in progress", "doing", "active", "进行中", "正在进行", "pågående"]),
    ("completed", &["completed", "done", "finished", "已完成", "完成", "klar", "avklarad"]),
    ("cancelled", &["cancelled", "canceled", "abandoned", "已取消", "取消", "avbruten", "inställd"]),
];

/// Built-in term set for a property.
pub fn builtin_terms(property: Property) -> PropertyTermSet {
    let table = match property {
        Property::Priority => PRIORITY,
        Property::DueDate => DUE_DATE,
        Property::Status => STATUS,
    };

    let mut set = PropertyTermSet::default();
    for (bucket, terms) in table {
        set.extend_bucket(bucket, terms.iter().map(ToString::to_string));
    }
    set
}
