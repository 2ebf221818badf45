fn main() {
    chat_relay::run();
}
