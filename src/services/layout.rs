use crate::config::LayoutConfig;
use crate::events::WindowGeometry;
use crate::services::screen::ScreenInfo;
use tracing::debug;

/// Расстановка окон: master слева, toon-клиенты столбцами
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPlan {
    pub master: WindowGeometry,
    pub toons: Vec<WindowGeometry>,
}

impl LayoutPlan {
    pub fn compute(screen: &ScreenInfo, layout: &LayoutConfig) -> Self {
        let master_height = screen.height.saturating_sub(layout.title_bar_height);
        let master_width = if layout.dual_monitor {
            screen.width
        } else {
            master_height * 4 / 3
        };
        let master = WindowGeometry::new(screen.offset, 0, master_width, master_height);

        let toons = if layout.toons == 0 {
            Vec::new()
        } else if layout.dual_monitor {
            Self::dual_monitor_toons(screen, layout.toons)
        } else {
            Self::single_column_toons(screen, master_width, layout.toons)
        };

        let plan = Self { master, toons };
        debug!("Раскладка окон: {:?}", plan);
        plan
    }

    /// Один монитор: столбец справа от master
    fn single_column_toons(screen: &ScreenInfo, master_width: u32, count: usize) -> Vec<WindowGeometry> {
        let width = screen.width.saturating_sub(master_width);
        let height = screen.height / count as u32;
        let x = screen.offset + master_width as i32;

        (0..count)
            .map(|i| WindowGeometry::new(x, (i as u32 * height) as i32, width, height))
            .collect()
    }

    /// Два монитора: master занимает основной, toon-клиенты второй, по ceil(n/2) в столбце
    fn dual_monitor_toons(screen: &ScreenInfo, count: usize) -> Vec<WindowGeometry> {
        let per_column = count.div_ceil(2);
        let width = screen.width / per_column as u32;
        let height = screen.height / per_column as u32;

        (0..count)
            .map(|i| {
                let column = (i / per_column) as u32;
                let row = (i % per_column) as u32;
                WindowGeometry::new((column * width) as i32, (row * height) as i32, width, height)
            })
            .collect()
    }

    /// Геометрия клиента по его индексу в реестре
    pub fn placement(&self, index: usize) -> Option<WindowGeometry> {
        match index {
            0 => Some(self.master),
            i => self.toons.get(i - 1).copied(),
        }
    }

    pub fn client_count(&self) -> usize {
        1 + self.toons.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(toons: usize, dual_monitor: bool) -> LayoutConfig {
        LayoutConfig {
            toons,
            dual_monitor,
            title_bar_height: 28,
        }
    }

    const FULL_HD: ScreenInfo = ScreenInfo { width: 1920, height: 1080, offset: 0 };

    #[test]
    fn test_single_monitor_layout() {
        let plan = LayoutPlan::compute(&FULL_HD, &layout(4, false));

        assert_eq!(plan.master, WindowGeometry::new(0, 0, 1402, 1052));
        assert_eq!(plan.client_count(), 5);
        assert_eq!(plan.toons[0], WindowGeometry::new(1402, 0, 518, 270));
        assert_eq!(plan.toons[3], WindowGeometry::new(1402, 810, 518, 270));
    }

    #[test]
    fn test_single_monitor_respects_offset() {
        let screen = ScreenInfo { width: 1920, height: 1080, offset: 1280 };
        let plan = LayoutPlan::compute(&screen, &layout(2, false));

        assert_eq!(plan.master.x, 1280);
        assert_eq!(plan.toons[0].x, 1280 + 1402);
        assert_eq!(plan.toons[1].y, 540);
    }

    #[test]
    fn test_dual_monitor_layout() {
        let plan = LayoutPlan::compute(&FULL_HD, &layout(4, true));

        assert_eq!(plan.master, WindowGeometry::new(0, 0, 1920, 1052));
        assert_eq!(
            plan.toons,
            vec![
                WindowGeometry::new(0, 0, 960, 540),
                WindowGeometry::new(0, 540, 960, 540),
                WindowGeometry::new(960, 0, 960, 540),
                WindowGeometry::new(960, 540, 960, 540),
            ]
        );
    }

    #[test]
    fn test_dual_monitor_odd_toon_count() {
        let plan = LayoutPlan::compute(&FULL_HD, &layout(3, true));

        assert_eq!(plan.toons.len(), 3);
        assert_eq!(plan.toons[1], WindowGeometry::new(0, 540, 960, 540));
        assert_eq!(plan.toons[2], WindowGeometry::new(960, 0, 960, 540));
    }

    #[test]
    fn test_zero_toons() {
        let plan = LayoutPlan::compute(&FULL_HD, &layout(0, false));

        assert!(plan.toons.is_empty());
        assert_eq!(plan.placement(0), Some(plan.master));
        assert_eq!(plan.placement(1), None);
    }
}
