use crate::notice::types::Department;
use chrono::NaiveDate;
use ratatui::prelude::Color;

/// Truncate to `max_len` chars, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a department tag
pub fn department_color(department: Department) -> Color {
  match department {
    Department::All | Department::Office => Color::White,
    Department::CE | Department::ME | Department::CS | Department::EC | Department::EE => {
      Color::Cyan
    }
    Department::Exams | Department::Results | Department::AdmissionTicket => Color::Yellow,
    Department::FeeDues | Department::Scholarships => Color::Magenta,
    Department::Admissions | Department::Internship => Color::Green,
    Department::AnnualDay | Department::Functions => Color::LightBlue,
  }
}

/// Notice dates as shown on the board, e.g. "05 Jun 2024"
pub fn format_date(date: NaiveDate) -> String {
  date.format("%d %b %Y").to_string()
}
