use ansi_term::Colour;

use super::AppTotal;

const BAR: char = '█';

/// Horizontal bar chart, one line per app. Bars are scaled so that the largest total fills
/// `width` cells; any non-zero total gets at least one cell.
pub fn render_bar_chart(totals: &[AppTotal], width: usize, colored: bool) -> String {
    let Some(max) = totals.iter().map(|v| v.total_duration).max() else {
        return String::new();
    };
    let label_width = totals
        .iter()
        .map(|v| v.app_name.chars().count())
        .max()
        .unwrap_or(0);

    let mut output = String::new();
    for total in totals {
        let cells = bar_cells(total.total_duration, max, width);
        let bar = BAR.to_string().repeat(cells);
        let bar = if colored {
            Colour::Cyan.paint(bar).to_string()
        } else {
            bar
        };
        output.push_str(&format!(
            "{:<label_width$}  {} {}m\n",
            total.app_name, bar, total.total_duration
        ));
    }
    output
}

fn bar_cells(value: u64, max: u64, width: usize) -> usize {
    if max == 0 || value == 0 {
        return 0;
    }
    let cells = (value as u128 * width as u128 / max as u128) as usize;
    cells.max(1)
}

#[cfg(test)]
mod tests {
    use super::{bar_cells, render_bar_chart};
    use crate::report::AppTotal;

    #[test]
    fn bars_scale_to_largest_total() {
        assert_eq!(bar_cells(8, 8, 40), 40);
        assert_eq!(bar_cells(4, 8, 40), 20);
        assert_eq!(bar_cells(1, 1000, 40), 1);
        assert_eq!(bar_cells(0, 8, 40), 0);
    }

    #[test]
    fn renders_one_line_per_app() {
        let totals = vec![
            AppTotal {
                app_name: "Social Media".into(),
                total_duration: 8,
            },
            AppTotal {
                app_name: "Games".into(),
                total_duration: 4,
            },
        ];
        let chart = render_bar_chart(&totals, 8, false);
        let lines = chart.lines().collect::<Vec<_>>();
        assert_eq!(lines, vec!["Social Media  ████████ 8m", "Games         ████ 4m"]);
    }

    #[test]
    fn empty_totals_render_nothing() {
        assert_eq!(render_bar_chart(&[], 10, true), "");
    }
}
