use crate::elevio::{Direction, Driver, Floor};

/// The button that exists for an order key.
///
/// Terminal hall orders are stored under their arrival direction (see
/// [`Orders::normalize`](super::orders::Orders::normalize)); the lamp to light is the one
/// button that floor has.
pub fn physical_button(floor: Floor, direction: Direction, num_floors: u8) -> Direction {
    match direction {
        Direction::Down if floor == 0 => Direction::Up,
        Direction::Up if floor + 1 == num_floors => Direction::Down,
        d => d,
    }
}

/// Sets the lamp of one order
///
/// ## Parameters
/// `e`: the driver
/// `floor`, `direction`: the order, normalized or not
/// `on`: lamp state
pub fn set_order_light<D: Driver>(e: &D, floor: Floor, direction: Direction, on: bool) {
    let button = physical_button(floor, direction, e.num_floors());
    e.button_lamp(on, floor, button);
}

/// The function sets the door open light on
pub fn set_door_open_light<D: Driver>(e: &D) {
    e.open_door();
}

/// The function sets the door open light off
pub fn clear_door_open_light<D: Driver>(e: &D) {
    e.close_door();
}

/// The function sets the stop button light on
pub fn set_stop_button_light<D: Driver>(e: &D) {
    e.stop_lamp(true);
}

/// The function sets the stop button light off
pub fn clear_stop_button_light<D: Driver>(e: &D) {
    e.stop_lamp(false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_keys_map_to_the_existing_button() {
        assert_eq!(physical_button(0, Direction::Down, 4), Direction::Up);
        assert_eq!(physical_button(3, Direction::Up, 4), Direction::Down);
        assert_eq!(physical_button(1, Direction::Down, 4), Direction::Down);
        assert_eq!(physical_button(3, Direction::None, 4), Direction::None);
    }
}
