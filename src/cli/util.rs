use chrono::NaiveDate;
use rust_decimal::Decimal;

pub fn fmt_money(d: Decimal) -> String {
    format!("${:.2}", d.round_dp(2))
}

pub fn fmt_date(d: &NaiveDate) -> String {
    d.format("%b %-d, %Y").to_string()
}

pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
